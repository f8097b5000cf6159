//! Shiftlog Sync - Background synchronization engine
//!
//! Drives pending records from the local store to the remote backend:
//!
//! - [`retry`] - Generic retry wrapper with exponential backoff and jitter
//! - [`pending`] - Aggregate pending-record counting across the three kinds
//! - [`status`] - Sync status reporting for the UI layer
//! - [`engine`] - The orchestrator: one full pass over all record kinds
//! - [`scheduler`] - Periodic and signal-driven pass triggering with an
//!   in-flight guard
//!
//! ## Flow
//!
//! ```text
//! timer tick ──┐
//! SyncSignal ──┼──► AutoSync ──► SyncEngine::sync_all ──► per-kind pass
//!              │    (guarded)         │                        │
//! offline? ────┘                 StatusPublisher        with_retry(submit)
//!                                                              │
//!                                                        mark_synced
//! ```

pub mod engine;
pub mod pending;
pub mod retry;
pub mod scheduler;
pub mod status;

pub use engine::{KindCounts, SyncEngine, SyncReport};
pub use pending::pending_count;
pub use retry::{with_retry, RetryPolicy};
pub use scheduler::{AutoSync, SyncSignal};
pub use status::SyncStatus;
