//! # Reconciler
//!
//! Reconciliation logic for `KMSVaultSecret` resources.
//!
//! - [`compose`]: includes, context precedence and decryption
//! - [`control_plane`]: Kubernetes reads, status patches, finalizers, events
//! - [`finalize`]: Vault cleanup on deletion
//! - [`status`]: the `Ready` condition and the `created` flag

pub mod compose;
pub mod control_plane;
pub mod finalize;
pub mod reconcile;
pub mod status;
pub mod types;

pub use control_plane::{ControlPlane, ControlPlaneError, EventKind, KubeControlPlane, SyncEvent};
pub use reconcile::reconcile;
pub use types::{Reconciler, ReconcilerError, SyncPhase};
