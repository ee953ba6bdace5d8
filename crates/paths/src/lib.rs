//! Shared API path definitions for HashiCorp Vault
//!
//! This crate centralizes every Vault endpoint the controller talks to so
//! the HTTP client, the admission webhook and the Pact contract tests agree
//! on the exact same paths.
//!
//! ## Quick Start
//!
//! ```rust
//! use vault_paths::prelude::*;
//!
//! let path = PathBuilder::new()
//!     .operation(VaultOperation::KvMetadata)
//!     .secret_path("secret/data/team/api")
//!     .build_http_path()
//!     .unwrap();
//! assert_eq!(path, "/v1/secret/metadata/team/api");
//! ```
//!
//! ## KV engines
//!
//! Paths for KV v2 are declared by users including the `data` segment
//! (`secret/data/foo`). Metadata operations (version lookup, full delete)
//! address the sibling `metadata` tree, see [`kv::metadata_path`].

pub mod auth;
pub mod builder;
pub mod errors;
pub mod formats;
pub mod kv;
pub mod operations;
pub mod prelude;
