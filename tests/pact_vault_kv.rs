//! Pact contract tests for the Vault KV engines
//!
//! These tests define the contract between the controller and the Vault KV
//! v1/v2 HTTP API. Each one drives [`VaultClient`] through the KV writer
//! against a Pact mock server.

mod common;

use common::init_rustls;
use kms_vault_controller::config::VaultConfig;
use kms_vault_controller::crd::{KvEngineVersion, KvSettings};
use kms_vault_controller::provider::vault::kv::{KvWriteError, KvWriter, SecretData, WriteOutcome};
use kms_vault_controller::provider::vault::VaultClient;
use kms_vault_controller::provider::KvBackend;
use pact_consumer::prelude::*;
use serde_json::json;
use zeroize::Zeroizing;

const TOKEN: &str = "s.controller-token";

fn client(mock_server: &dyn ValidatingMockServer) -> VaultClient {
    let mut base_url = mock_server.url().to_string();
    if base_url.ends_with('/') {
        base_url.pop();
    }
    let config = VaultConfig {
        address: base_url,
        ..VaultConfig::default()
    };
    VaultClient::new(&config)
        .expect("Failed to build Vault client")
        .with_token(TOKEN)
}

fn hello_world() -> SecretData {
    SecretData::from([("Hello".to_string(), Zeroizing::new("world".to_string()))])
}

fn v2(cas_index: u64) -> KvWriter {
    KvWriter::from_settings(&KvSettings {
        engine_version: KvEngineVersion::V2,
        cas_index,
    })
}

#[tokio::test]
async fn test_vault_kv_v1_write_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("KMS-Vault-Controller", "Vault");

    pact_builder.interaction("write a secret to a KV v1 mount", "", |mut i| {
        i.given("a KV v1 engine is mounted at kv");
        i.request
            .method("POST")
            .path("/v1/kv/payments/api")
            .header("X-Vault-Token", TOKEN)
            .header("X-Vault-Request", "true")
            .json_body(json!({"Hello": "world"}));
        i.response.status(204);
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let outcome = KvWriter::Unversioned
        .write(&client(mock_server.as_ref()), "kv/payments/api", &hello_world())
        .await
        .expect("KV v1 write failed");

    assert_eq!(outcome, WriteOutcome::Written);
}

#[tokio::test]
async fn test_vault_kv_v2_first_write_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("KMS-Vault-Controller", "Vault");

    pact_builder
        .interaction("read metadata of a secret that does not exist", "", |mut i| {
            i.given("secret/payments/api does not exist");
            i.request
                .method("GET")
                .path("/v1/secret/metadata/payments/api")
                .header("X-Vault-Token", TOKEN);
            i.response
                .status(404)
                .header("content-type", "application/json")
                .json_body(json!({"errors": []}));
            i
        })
        .interaction("create a secret with check-and-set 0", "", |mut i| {
            i.given("secret/payments/api does not exist");
            i.request
                .method("POST")
                .path("/v1/secret/data/payments/api")
                .header("X-Vault-Token", TOKEN)
                .json_body(json!({
                    "data": {"Hello": "world"},
                    "options": {"cas": 0}
                }));
            i.response
                .status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "data": {
                        "created_time": "2026-01-01T00:00:00Z",
                        "deletion_time": "",
                        "destroyed": false,
                        "version": 1
                    }
                }));
            i
        });

    let mock_server = pact_builder.start_mock_server(None, None);
    let outcome = v2(0)
        .write(&client(mock_server.as_ref()), "secret/data/payments/api", &hello_world())
        .await
        .expect("KV v2 write failed");

    assert_eq!(outcome, WriteOutcome::Written);
}

#[tokio::test]
async fn test_vault_kv_v2_already_applied_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("KMS-Vault-Controller", "Vault");

    pact_builder.interaction("read metadata of a secret at version 4", "", |mut i| {
        i.given("secret/payments/api is at version 4");
        i.request
            .method("GET")
            .path("/v1/secret/metadata/payments/api")
            .header("X-Vault-Token", TOKEN);
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "data": {
                    "current_version": 4,
                    "max_versions": 0,
                    "oldest_version": 1,
                    "cas_required": false
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let outcome = v2(3)
        .write(&client(mock_server.as_ref()), "secret/payments/api", &hello_world())
        .await
        .expect("KV v2 version check failed");

    assert_eq!(outcome, WriteOutcome::AlreadyApplied { version: 4 });
}

#[tokio::test]
async fn test_vault_kv_v2_cas_mismatch_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("KMS-Vault-Controller", "Vault");

    pact_builder
        .interaction("read metadata of a secret at version 1", "", |mut i| {
            i.given("secret/payments/api is at version 1");
            i.request
                .method("GET")
                .path("/v1/secret/metadata/payments/api")
                .header("X-Vault-Token", TOKEN);
            i.response
                .status(200)
                .header("content-type", "application/json")
                .json_body(json!({"data": {"current_version": 1}}));
            i
        })
        .interaction("write with a stale check-and-set index", "", |mut i| {
            i.given("secret/payments/api was updated concurrently");
            i.request
                .method("POST")
                .path("/v1/secret/data/payments/api")
                .header("X-Vault-Token", TOKEN)
                .json_body(json!({
                    "data": {"Hello": "world"},
                    "options": {"cas": 1}
                }));
            i.response
                .status(400)
                .header("content-type", "application/json")
                .json_body(json!({
                    "errors": ["check-and-set parameter did not match the current version"]
                }));
            i
        });

    let mock_server = pact_builder.start_mock_server(None, None);
    let err = v2(1)
        .write(&client(mock_server.as_ref()), "secret/data/payments/api", &hello_world())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        KvWriteError::Conflict {
            cas_index: 1,
            current_version: None,
            ..
        }
    ));
}

#[tokio::test]
async fn test_vault_kv_v2_delete_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("KMS-Vault-Controller", "Vault");

    pact_builder.interaction("delete all versions of a secret", "", |mut i| {
        i.given("secret/payments/api exists");
        i.request
            .method("DELETE")
            .path("/v1/secret/metadata/payments/api")
            .header("X-Vault-Token", TOKEN);
        i.response.status(204);
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    v2(0)
        .delete(&client(mock_server.as_ref()), "secret/data/payments/api")
        .await
        .expect("KV v2 delete failed");
}

#[tokio::test]
async fn test_vault_kv_delete_missing_path_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("KMS-Vault-Controller", "Vault");

    pact_builder.interaction("delete a secret that does not exist", "", |mut i| {
        i.given("kv/payments/api does not exist");
        i.request
            .method("DELETE")
            .path("/v1/kv/payments/api")
            .header("X-Vault-Token", TOKEN);
        i.response
            .status(404)
            .header("content-type", "application/json")
            .json_body(json!({"errors": []}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let vault = client(mock_server.as_ref());

    assert!(vault.delete("kv/payments/api").await.is_ok());
}

#[tokio::test]
async fn test_vault_kv_permission_denied_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("KMS-Vault-Controller", "Vault");

    pact_builder.interaction("write without a policy granting access", "", |mut i| {
        i.given("the token has no policy for kv/restricted");
        i.request
            .method("POST")
            .path("/v1/kv/restricted")
            .header("X-Vault-Token", TOKEN);
        i.response
            .status(403)
            .header("content-type", "application/json")
            .json_body(json!({"errors": ["1 error occurred:\n\t* permission denied\n\n"]}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let err = KvWriter::Unversioned
        .write(&client(mock_server.as_ref()), "kv/restricted", &hello_world())
        .await
        .unwrap_err();

    match err {
        KvWriteError::Store(store) => {
            assert_eq!(store.status(), Some(403));
            assert!(store.to_string().contains("permission denied"));
        }
        other => panic!("expected store error, got {other:?}"),
    }
}
