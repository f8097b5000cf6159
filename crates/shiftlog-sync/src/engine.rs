//! Sync orchestrator
//!
//! The [`SyncEngine`] drives one full synchronization pass: for each of the
//! three record kinds it fetches the pending set, pushes every record
//! through the retry wrapper to the remote backend, and marks the accepted
//! ones synced in the local store.
//!
//! ## Guarantees
//!
//! - The three per-kind passes run concurrently; no ordering between them.
//! - Failures are isolated per record: a rejected checklist never blocks
//!   the next checklist, and a broken kind never blocks the other kinds.
//! - A record marked synced drops out of every future pending set and is
//!   never submitted again.
//! - The engine never mutates records directly; the only local write is
//!   the store's `mark_synced`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use shiftlog_core::domain::newtypes::OwnerId;
use shiftlog_core::domain::record::{RecordKind, Syncable};
use shiftlog_core::ports::record_store::{IRecordStore, StoreError};
use shiftlog_core::ports::remote_backend::{IRemoteBackend, RemoteError};

use crate::pending;
use crate::retry::{with_retry, RetryPolicy};
use crate::status::{StatusPublisher, SyncStatus};

// ============================================================================
// Pass results
// ============================================================================

/// Outcome counters for one record kind within a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    /// Records accepted remotely and marked synced locally
    pub synced: u32,
    /// Records left pending after retry exhaustion or terminal rejection
    pub failed: u32,
}

/// Summary of a completed synchronization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub checklists: KindCounts,
    pub non_conformances: KindCounts,
    pub incidents: KindCounts,
}

impl SyncReport {
    /// Total records synced across all kinds
    #[must_use]
    pub fn total_synced(&self) -> u32 {
        self.checklists.synced + self.non_conformances.synced + self.incidents.synced
    }

    /// Total records that stayed pending
    #[must_use]
    pub fn total_failed(&self) -> u32 {
        self.checklists.failed + self.non_conformances.failed + self.incidents.failed
    }
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Orchestrates synchronization passes over the injected ports
///
/// ## Dependencies
///
/// - `store`: local record persistence (pending sets, `mark_synced`)
/// - `backend`: remote submission, one insert per record
/// - `retry`: backoff policy shared by every submission
pub struct SyncEngine {
    store: Arc<dyn IRecordStore>,
    backend: Arc<dyn IRemoteBackend>,
    retry: RetryPolicy,
    status: StatusPublisher,
}

impl SyncEngine {
    /// Creates a new engine with the given dependencies
    ///
    /// `cooldown` is how long the success/error status lingers before the
    /// publisher resets to idle.
    pub fn new(
        store: Arc<dyn IRecordStore>,
        backend: Arc<dyn IRemoteBackend>,
        retry: RetryPolicy,
        cooldown: Duration,
    ) -> Self {
        Self {
            store,
            backend,
            retry,
            status: StatusPublisher::new(cooldown),
        }
    }

    /// Returns a receiver for status transitions
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Counts pending records across all three kinds
    pub async fn pending_count(&self) -> Result<u64, StoreError> {
        pending::pending_count(self.store.as_ref()).await
    }

    /// Runs one full synchronization pass
    ///
    /// The three kinds sync concurrently. A store failure while fetching a
    /// pending set surfaces as the pass error after the other kinds have
    /// finished; remote failures never do — they are counted per record.
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered; the scheduler logs it
    /// and retries on the next tick.
    #[tracing::instrument(skip(self))]
    pub async fn sync_all(&self, owner: OwnerId) -> Result<SyncReport, StoreError> {
        self.status.set_syncing();

        let (checklists, non_conformances, incidents) = tokio::join!(
            self.sync_checklists(owner),
            self.sync_non_conformances(owner),
            self.sync_incidents(owner),
        );

        let outcome = (|| {
            let report = SyncReport {
                checklists: checklists?,
                non_conformances: non_conformances?,
                incidents: incidents?,
            };
            Ok::<_, StoreError>(report)
        })();

        match &outcome {
            Ok(report) => {
                info!(
                    synced = report.total_synced(),
                    failed = report.total_failed(),
                    "Sync pass completed"
                );
                self.status.finish(if report.total_failed() == 0 {
                    SyncStatus::Success
                } else {
                    SyncStatus::Error
                });
            }
            Err(err) => {
                warn!(error = %err, "Sync pass failed");
                self.status.finish(SyncStatus::Error);
            }
        }

        outcome
    }

    // ========================================================================
    // Per-kind passes
    // ========================================================================

    async fn sync_checklists(&self, owner: OwnerId) -> Result<KindCounts, StoreError> {
        let pending = self.store.get_pending_checklists().await?;
        let backend = Arc::clone(&self.backend);
        Ok(self
            .sync_kind(RecordKind::Checklist, pending, move |record| {
                let backend = Arc::clone(&backend);
                async move { backend.submit_checklist(&record, owner).await }
            })
            .await)
    }

    async fn sync_non_conformances(&self, owner: OwnerId) -> Result<KindCounts, StoreError> {
        let pending = self.store.get_pending_non_conformances().await?;
        let backend = Arc::clone(&self.backend);
        Ok(self
            .sync_kind(RecordKind::NonConformance, pending, move |record| {
                let backend = Arc::clone(&backend);
                async move { backend.submit_non_conformance(&record, owner).await }
            })
            .await)
    }

    async fn sync_incidents(&self, owner: OwnerId) -> Result<KindCounts, StoreError> {
        let pending = self.store.get_pending_incidents().await?;
        let backend = Arc::clone(&self.backend);
        Ok(self
            .sync_kind(RecordKind::Incident, pending, move |record| {
                let backend = Arc::clone(&backend);
                async move { backend.submit_incident(&record, owner).await }
            })
            .await)
    }

    /// Pushes one kind's pending set, record by record
    ///
    /// Submission goes through the retry wrapper; every attempt clones the
    /// record into the closure, so the sequence for one record is strictly
    /// sequential while different records interleave freely across kinds.
    async fn sync_kind<R, Sub, Fut>(
        &self,
        kind: RecordKind,
        pending: Vec<R>,
        submit: Sub,
    ) -> KindCounts
    where
        R: Syncable + Clone,
        Sub: Fn(R) -> Fut,
        Fut: Future<Output = Result<(), RemoteError>>,
    {
        let mut counts = KindCounts::default();

        for record in pending {
            let label = format!("{} {}", kind, record.id());

            match with_retry(&self.retry, &label, || submit(record.clone())).await {
                Ok(()) => match self.store.mark_synced(kind, record.id()).await {
                    Ok(()) => counts.synced += 1,
                    Err(err) => {
                        // Accepted remotely but not acknowledged locally:
                        // the record stays pending and the next pass lands
                        // on the duplicate-key path.
                        warn!(
                            kind = %kind,
                            id = %record.id(),
                            error = %err,
                            "Failed to mark record synced"
                        );
                        counts.failed += 1;
                    }
                },
                Err(err) => {
                    warn!(
                        kind = %kind,
                        id = %record.id(),
                        error = %err,
                        "Record submission failed, leaving pending"
                    );
                    counts.failed += 1;
                }
            }
        }

        counts
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_totals() {
        let report = SyncReport {
            checklists: KindCounts { synced: 2, failed: 0 },
            non_conformances: KindCounts { synced: 0, failed: 1 },
            incidents: KindCounts { synced: 1, failed: 3 },
        };
        assert_eq!(report.total_synced(), 3);
        assert_eq!(report.total_failed(), 4);
    }

    #[test]
    fn test_empty_report() {
        let report = SyncReport::default();
        assert_eq!(report.total_synced(), 0);
        assert_eq!(report.total_failed(), 0);
    }
}
