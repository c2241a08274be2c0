//! sprig-semantic library.
//!
//! Everything that turns text into vectors and decisions: the embedding
//! provider seam, cosine-similarity matching, the deduplication gate
//! that keeps machine-suggested tasks from re-entering the ledger, and
//! the free-text task extraction client.

pub mod dedupe;
pub mod extract;
pub mod provider;
pub mod similar;
pub mod suggest;
