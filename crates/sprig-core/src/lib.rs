//! sprig-core library.
//!
//! The canonical task ledger and the machinery around it: record model,
//! diff reconciliation, SQLite persistence, and the per-session context
//! that ties them together.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result` at operation boundaries; typed errors
//!   (`ReconcileError`) where callers branch on the failure.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod error;
pub mod ledger;
pub mod model;
pub mod reconcile;
pub mod session;
pub mod store;
