//! # Controller
//!
//! - `admission`: validating webhook for KMSVaultSecret and PartialKMSVaultSecret
//! - `reconciler`: sync of KMSVaultSecret resources into Vault
//! - `server`: HTTP server for metrics and health checks

pub mod admission;
pub mod reconciler;
pub mod server;
