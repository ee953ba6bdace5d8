//! PEM loading

use super::TlsError;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::sign::CertifiedKey;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Read a certificate chain and its private key into a signing-ready key pair
pub fn load_certified_key(cert_path: &Path, key_path: &Path) -> Result<CertifiedKey, TlsError> {
    let pem_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| TlsError::Pem { path, source }
    };

    let chain = CertificateDer::pem_file_iter(cert_path)
        .map_err(pem_error(cert_path))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(pem_error(cert_path))?;
    if chain.is_empty() {
        return Err(TlsError::NoCertificates(cert_path.to_path_buf()));
    }

    let key = PrivateKeyDer::from_pem_file(key_path).map_err(pem_error(key_path))?;
    let signing_key =
        rustls::crypto::ring::sign::any_supported_type(&key).map_err(|source| TlsError::Key {
            path: key_path.to_path_buf(),
            source,
        })?;

    Ok(CertifiedKey::new(chain, signing_key))
}

/// SHA-256 of the leaf certificate, lowercase hex
pub fn fingerprint(key: &CertifiedKey) -> String {
    key.cert
        .first()
        .map(|leaf| {
            Sha256::digest(leaf.as_ref())
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/tls")
            .join(name)
    }

    #[test]
    fn test_load_fixture_pair() {
        let key = load_certified_key(&fixture("first.crt"), &fixture("first.key")).unwrap();
        assert_eq!(key.cert.len(), 1);
        assert_eq!(fingerprint(&key).len(), 64);
    }

    #[test]
    fn test_distinct_certificates_have_distinct_fingerprints() {
        let first = load_certified_key(&fixture("first.crt"), &fixture("first.key")).unwrap();
        let second = load_certified_key(&fixture("second.crt"), &fixture("second.key")).unwrap();
        assert_ne!(fingerprint(&first), fingerprint(&second));
    }

    #[test]
    fn test_key_file_without_key() {
        let err = load_certified_key(&fixture("first.crt"), &fixture("first.crt")).unwrap_err();
        assert!(matches!(err, TlsError::Pem { .. }));
    }

    #[test]
    fn test_empty_certificate_file() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("tls.crt");
        std::fs::write(&empty, "").unwrap();
        let err = load_certified_key(&empty, &fixture("first.key")).unwrap_err();
        assert!(matches!(err, TlsError::NoCertificates(_)));
    }
}
