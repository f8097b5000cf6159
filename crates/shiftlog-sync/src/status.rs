//! Sync status reporting
//!
//! Publishes the orchestrator's state machine on a `tokio::sync::watch`
//! channel so the UI layer can render a banner without polling:
//!
//! ```text
//! idle ──► syncing ──► success ──┐
//!   ▲            └───► error ────┤
//!   └──────── cool-down ─────────┘
//! ```
//!
//! The terminal outcome lingers for a short cool-down (default 3 s) and
//! then resets to idle, unless a new pass started in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

// ============================================================================
// SyncStatus
// ============================================================================

/// User-visible synchronization state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing happening; the queue may or may not be empty
    Idle,
    /// A pass is running
    Syncing,
    /// A submission is backing off between attempts
    ///
    /// The orchestrator itself only publishes `Syncing` while a pass runs;
    /// this variant exists for UI layers that track the retry wrapper's
    /// log output and want to render "retrying" distinctly.
    Retrying,
    /// The last pass completed with every record accepted
    Success,
    /// The last pass failed, or left records behind
    Error,
}

// ============================================================================
// StatusPublisher
// ============================================================================

/// Publishes status transitions with a cool-down reset
///
/// Each transition bumps an epoch counter; the deferred reset to idle
/// only fires if no newer transition happened during the cool-down.
pub struct StatusPublisher {
    tx: watch::Sender<SyncStatus>,
    cooldown: Duration,
    epoch: Arc<AtomicU64>,
}

impl StatusPublisher {
    /// Creates a publisher starting at `Idle`
    pub fn new(cooldown: Duration) -> Self {
        let (tx, _rx) = watch::channel(SyncStatus::Idle);
        Self {
            tx,
            cooldown,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns a receiver for status updates
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.tx.subscribe()
    }

    /// Marks a pass as started
    pub fn set_syncing(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        // send_replace never fails; it updates even with no receivers.
        self.tx.send_replace(SyncStatus::Syncing);
    }

    /// Publishes the pass outcome and schedules the reset to idle
    pub fn finish(&self, outcome: SyncStatus) {
        let epoch_at_finish = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        self.tx.send_replace(outcome);

        let tx = self.tx.clone();
        let epoch = Arc::clone(&self.epoch);
        let cooldown = self.cooldown;
        tokio::spawn(async move {
            tokio::time::sleep(cooldown).await;
            // A newer transition supersedes this reset.
            if epoch.load(Ordering::Acquire) == epoch_at_finish {
                tx.send_replace(SyncStatus::Idle);
            }
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_publisher() -> StatusPublisher {
        StatusPublisher::new(Duration::from_millis(30))
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let publisher = fast_publisher();
        assert_eq!(*publisher.subscribe().borrow(), SyncStatus::Idle);
    }

    #[tokio::test]
    async fn test_syncing_then_outcome() {
        let publisher = fast_publisher();
        let rx = publisher.subscribe();

        publisher.set_syncing();
        assert_eq!(*rx.borrow(), SyncStatus::Syncing);

        publisher.finish(SyncStatus::Success);
        assert_eq!(*rx.borrow(), SyncStatus::Success);
    }

    #[tokio::test]
    async fn test_outcome_resets_to_idle_after_cooldown() {
        let publisher = fast_publisher();
        let rx = publisher.subscribe();

        publisher.set_syncing();
        publisher.finish(SyncStatus::Error);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*rx.borrow(), SyncStatus::Idle);
    }

    #[tokio::test]
    async fn test_new_pass_cancels_stale_reset() {
        let publisher = fast_publisher();
        let rx = publisher.subscribe();

        publisher.set_syncing();
        publisher.finish(SyncStatus::Success);

        // A new pass starts before the cool-down elapses.
        publisher.set_syncing();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // The stale reset must not have fired over the running pass.
        assert_eq!(*rx.borrow(), SyncStatus::Syncing);
    }
}
