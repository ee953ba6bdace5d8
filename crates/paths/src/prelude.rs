//! # Prelude
//!
//! Re-exports commonly used types for convenience.
//!
//! ```rust
//! use vault_paths::prelude::*;
//!
//! let path = PathBuilder::new()
//!     .operation(VaultOperation::TokenLookupSelf)
//!     .build_http_path();
//! ```

// Core PathBuilder types
pub use crate::builder::PathBuilder;
pub use crate::errors::PathBuilderError;
pub use crate::formats::PathFormat;
pub use crate::operations::VaultOperation;
