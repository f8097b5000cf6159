//! Auto-sync scheduler
//!
//! The [`AutoSync`] scheduler owns the background loop that decides *when*
//! a pass runs. Three things can trigger one:
//!
//! 1. the periodic timer tick,
//! 2. a [`SyncSignal`] from the environment (connectivity restored, or an
//!    explicit "sync needed" broadcast),
//! 3. nothing else — there is no queueing of skipped triggers.
//!
//! ## In-flight guard
//!
//! A single `AtomicBool` is the only concurrency-control primitive: a
//! trigger that finds it set walks away, so two passes never overlap and
//! no record is submitted or marked twice concurrently. The flag is
//! released by a drop guard, so a panicking pass cannot wedge the loop.
//!
//! ```text
//! timer tick ──┐                       ┌── offline? skip
//! SyncSignal ──┼──► try_pass ──────────┼── in flight? skip
//! stop/shutdown┘        │              └── pending == 0? skip
//!                       ▼
//!              InFlightGuard + sync_all
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use shiftlog_core::domain::newtypes::OwnerId;
use shiftlog_core::ports::connectivity::IConnectivityMonitor;

use crate::engine::SyncEngine;

// ============================================================================
// SyncSignal
// ============================================================================

/// Out-of-band trigger for an immediate pass
///
/// Both variants obey the same in-flight/offline/empty-queue checks as a
/// timer tick; the distinction exists for log output only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSignal {
    /// The environment asked for a sync (e.g. a push notification arrived)
    SyncRequested,
    /// Connectivity came back after an offline stretch
    ConnectivityRestored,
}

// ============================================================================
// InFlightGuard
// ============================================================================

/// Releases the in-flight flag on drop
///
/// The flag must be cleared on every exit path of a pass, including a
/// panic unwinding through it; tying the release to `Drop` is the
/// try/finally this loop needs.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// AutoSync
// ============================================================================

/// Background scheduler for synchronization passes
///
/// Owned state instead of module globals: the timer handle and the
/// in-flight flag live on this struct, and the engine and connectivity
/// monitor are injected, so the whole lifecycle is testable in isolation.
pub struct AutoSync {
    engine: Arc<SyncEngine>,
    connectivity: Arc<dyn IConnectivityMonitor>,
    in_flight: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    shutdown: CancellationToken,
}

impl AutoSync {
    /// Creates a stopped scheduler over the injected dependencies
    pub fn new(
        engine: Arc<SyncEngine>,
        connectivity: Arc<dyn IConnectivityMonitor>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            connectivity,
            in_flight: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            shutdown,
        }
    }

    /// Starts the background loop; no-op if already started
    ///
    /// `signal_rx` carries the out-of-band triggers. The first timer tick
    /// fires one `interval` after start, not immediately.
    pub fn start(
        &self,
        owner: OwnerId,
        interval: Duration,
        signal_rx: mpsc::Receiver<SyncSignal>,
    ) {
        let mut guard = match self.handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.is_some() {
            debug!("Auto-sync already started, ignoring");
            return;
        }

        info!(interval_secs = interval.as_secs(), "Starting auto-sync");

        let engine = Arc::clone(&self.engine);
        let connectivity = Arc::clone(&self.connectivity);
        let in_flight = Arc::clone(&self.in_flight);
        let shutdown = self.shutdown.clone();

        *guard = Some(tokio::spawn(async move {
            Self::run_loop(
                engine,
                connectivity,
                in_flight,
                owner,
                interval,
                signal_rx,
                shutdown,
            )
            .await;
        }));
    }

    /// Stops the background loop; idempotent, safe when never started
    pub fn stop(&self) {
        self.shutdown.cancel();
        let mut guard = match self.handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.take().is_some() {
            info!("Auto-sync stopped");
        }
    }

    /// Whether a pass is currently running
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    // ========================================================================
    // Loop body
    // ========================================================================

    async fn run_loop(
        engine: Arc<SyncEngine>,
        connectivity: Arc<dyn IConnectivityMonitor>,
        in_flight: Arc<AtomicBool>,
        owner: OwnerId,
        interval: Duration,
        mut signal_rx: mpsc::Receiver<SyncSignal>,
        shutdown: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        // tokio intervals fire immediately; swallow the first tick so the
        // loop waits a full interval after start.
        ticker.tick().await;

        let mut signals_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    Self::try_pass(&engine, &connectivity, &in_flight, owner, "timer tick").await;
                }

                signal = signal_rx.recv(), if signals_open => {
                    match signal {
                        Some(signal) => {
                            debug!(?signal, "Out-of-band sync trigger");
                            Self::try_pass(&engine, &connectivity, &in_flight, owner, "signal").await;
                        }
                        None => {
                            // All senders dropped; the timer keeps the loop alive.
                            debug!("Sync signal channel closed");
                            signals_open = false;
                        }
                    }
                }

                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, auto-sync loop exiting");
                    break;
                }
            }
        }
    }

    /// Runs one guarded pass attempt
    ///
    /// Skips without queueing when offline, when a pass is already in
    /// flight, or when nothing is pending. Errors from the engine are
    /// logged and absorbed; the next trigger retries.
    async fn try_pass(
        engine: &SyncEngine,
        connectivity: &Arc<dyn IConnectivityMonitor>,
        in_flight: &Arc<AtomicBool>,
        owner: OwnerId,
        trigger: &str,
    ) {
        if !connectivity.is_online() {
            debug!(trigger, "Device offline, skipping sync");
            return;
        }

        if in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(trigger, "Pass already in flight, skipping");
            return;
        }
        let _guard = InFlightGuard(Arc::clone(in_flight));

        let pending = match engine.pending_count().await {
            Ok(count) => count,
            Err(err) => {
                warn!(trigger, error = %err, "Failed to count pending records");
                return;
            }
        };
        if pending == 0 {
            debug!(trigger, "Nothing pending, skipping sync");
            return;
        }

        info!(trigger, pending, "Starting sync pass");
        match engine.sync_all(owner).await {
            Ok(report) => {
                info!(
                    trigger,
                    synced = report.total_synced(),
                    failed = report.total_failed(),
                    "Sync pass finished"
                );
            }
            Err(err) => {
                error!(trigger, error = %err, "Sync pass failed");
            }
        }
    }
}

// ============================================================================
// Unit tests
// ============================================================================
