//! KMS Vault Controller Library
//!
//! Decrypts KMS-encrypted secret bundles declared as `KMSVaultSecret`
//! resources and writes them to HashiCorp Vault.
//!
//! ## Quick Start
//!
//! ```rust
//! use kms_vault_controller::prelude::*;
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
pub mod tls;
