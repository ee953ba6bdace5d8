//! Serving certificate hot reload

mod common;

use common::init_rustls;
use kms_vault_controller::tls::{fingerprint, load_certified_key, server_config, CertificateReloader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/tls")
        .join(name)
}

/// Copy the named fixture pair into `dir` as tls.crt / tls.key
fn install_pair(dir: &Path, pair: &str) -> (PathBuf, PathBuf) {
    let cert = dir.join("tls.crt");
    let key = dir.join("tls.key");
    std::fs::copy(fixture(&format!("{pair}.crt")), &cert).unwrap();
    std::fs::copy(fixture(&format!("{pair}.key")), &key).unwrap();
    (cert, key)
}

fn fixture_fingerprint(pair: &str) -> String {
    let key = load_certified_key(
        &fixture(&format!("{pair}.crt")),
        &fixture(&format!("{pair}.key")),
    )
    .unwrap();
    fingerprint(&key)
}

#[test]
fn test_reload_swaps_served_certificate() {
    init_rustls();
    let dir = TempDir::new().unwrap();
    let (cert, key) = install_pair(dir.path(), "first");

    let (reloader, resolver) = CertificateReloader::load(&cert, &key).unwrap();
    assert_eq!(fingerprint(&resolver.current()), fixture_fingerprint("first"));

    install_pair(dir.path(), "second");
    reloader.reload().unwrap();

    assert_eq!(fingerprint(&resolver.current()), fixture_fingerprint("second"));
}

#[test]
fn test_failed_reload_keeps_previous_certificate() {
    init_rustls();
    let dir = TempDir::new().unwrap();
    let (cert, key) = install_pair(dir.path(), "first");
    let (reloader, resolver) = CertificateReloader::load(&cert, &key).unwrap();

    std::fs::write(&key, "not a key").unwrap();

    assert!(reloader.reload().is_err());
    assert_eq!(fingerprint(&resolver.current()), fixture_fingerprint("first"));
}

#[test]
fn test_resolver_backs_server_config() {
    init_rustls();
    let (_, resolver) =
        CertificateReloader::load(&fixture("first.crt"), &fixture("first.key")).unwrap();

    let config = server_config(resolver).unwrap();

    assert_eq!(
        config.alpn_protocols,
        vec![b"h2".to_vec(), b"http/1.1".to_vec()]
    );
}

#[tokio::test]
async fn test_file_change_is_picked_up_by_running_reloader() {
    init_rustls();
    let dir = TempDir::new().unwrap();
    let (cert, key) = install_pair(dir.path(), "first");
    let (reloader, resolver) = CertificateReloader::load(&cert, &key).unwrap();

    let task = tokio::spawn(reloader.run(Duration::from_millis(100)));
    // Let the watcher register before touching the files
    tokio::time::sleep(Duration::from_millis(300)).await;
    // Stage then rename, so no reload ever sees a half-written file
    let staging = TempDir::new_in(dir.path()).unwrap();
    let (staged_cert, staged_key) = install_pair(staging.path(), "second");
    std::fs::rename(staged_key, &key).unwrap();
    std::fs::rename(staged_cert, &cert).unwrap();

    let expected = fixture_fingerprint("second");
    let swapped = tokio::time::timeout(Duration::from_secs(10), async {
        while fingerprint(&resolver.current()) != expected {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;

    assert!(swapped.is_ok(), "certificate was not reloaded");
    assert!(!task.is_finished());
    task.abort();
}
