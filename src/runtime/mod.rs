//! # Runtime
//!
//! Process wiring for the controller binary.
//!
//! - `initialization`: crypto provider, logging, metrics server, clients, reconciler
//! - `watch_loop`: kube-runtime controller with restart on stream end
//! - `error_policy`: requeue policy for failed passes
//! - `trust_watch`: Vault CA material hot reload

pub mod error_policy;
pub mod initialization;
pub mod trust_watch;
pub mod watch_loop;
