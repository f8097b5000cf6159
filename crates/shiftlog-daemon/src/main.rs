//! Shiftlog Daemon - Background synchronization service
//!
//! This binary runs as a systemd user service and handles:
//! - Draining the local record queue to the remote store
//! - Periodic connectivity probing against the remote store
//! - Immediate resync when connectivity comes back
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon opens the local store, wires the REST backend into the sync
//! engine, and hands both to the auto-sync scheduler. A probe task flips
//! the shared connectivity flag and feeds recovery signals into the
//! scheduler. Everything is torn down through one `CancellationToken`
//! triggered on receipt of SIGTERM or SIGINT.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use shiftlog_core::config::Config;
use shiftlog_core::domain::newtypes::OwnerId;
use shiftlog_core::ports::connectivity::IConnectivityMonitor;
use shiftlog_core::ports::remote_backend::IRemoteBackend;
use shiftlog_remote::{RestBackend, RestClient};
use shiftlog_store::{DatabasePool, SqliteRecordStore};
use shiftlog_sync::{AutoSync, RetryPolicy, SyncEngine, SyncSignal};

// ============================================================================
// Connectivity probe
// ============================================================================

/// Connectivity monitor backed by the probe task's shared flag
struct ProbeConnectivity {
    online: Arc<AtomicBool>,
}

impl IConnectivityMonitor for ProbeConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }
}

/// Periodically probes the remote store and maintains the online flag
///
/// An offline-to-online transition pushes a recovery signal into the
/// scheduler so queued records drain immediately instead of waiting for
/// the next timer tick.
async fn connectivity_probe(
    backend: Arc<dyn IRemoteBackend>,
    online: Arc<AtomicBool>,
    signal_tx: mpsc::Sender<SyncSignal>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let reachable = backend.health_check().await.is_ok();
                let was_online = online.swap(reachable, Ordering::AcqRel);

                if reachable && !was_online {
                    info!("Remote store reachable again");
                    if signal_tx.send(SyncSignal::ConnectivityRestored).await.is_err() {
                        // Scheduler is gone; the shutdown branch will fire next.
                        warn!("Sync signal channel closed");
                    }
                } else if !reachable && was_online {
                    warn!("Remote store unreachable, queueing records locally");
                }
            }

            _ = shutdown.cancelled() => break,
        }
    }
}

// ============================================================================
// DaemonService
// ============================================================================

/// Main daemon service wiring storage, remote client and scheduler
///
/// Holds the configuration, the opened store, and a cancellation token
/// for graceful shutdown.
struct DaemonService {
    config: Config,
    store: Arc<SqliteRecordStore>,
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Creates a new DaemonService
    ///
    /// Loads configuration and opens the database.
    async fn new(shutdown: CancellationToken) -> Result<Self> {
        let config_path = Config::default_path();
        let config = Config::load_or_default(&config_path);
        info!(config_path = %config_path.display(), "Loaded configuration");

        let pool = DatabasePool::open(&config.storage.database)
            .await
            .context("Failed to open database")?;
        let store = Arc::new(SqliteRecordStore::new(pool.pool().clone()));

        Ok(Self {
            config,
            store,
            shutdown,
        })
    }

    /// Runs the daemon until a shutdown signal arrives
    ///
    /// 1. Resolves the owner attribution from configuration
    /// 2. Builds the REST backend and the sync engine
    /// 3. Starts the connectivity probe and the auto-sync scheduler
    /// 4. Parks on the cancellation token
    async fn run(&self) -> Result<()> {
        let owner: OwnerId = match self.config.remote.owner_id.as_deref() {
            Some(raw) => raw
                .parse()
                .context("remote.owner_id in the configuration is not a valid UUID")?,
            None => {
                anyhow::bail!(
                    "No owner configured. Set remote.owner_id in {} first.",
                    Config::default_path().display()
                );
            }
        };

        let client = RestClient::new(
            self.config.remote.base_url.clone(),
            self.config.remote.service_key.clone(),
        );
        let backend: Arc<dyn IRemoteBackend> = Arc::new(RestBackend::new(client));

        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&self.store) as _,
            Arc::clone(&backend),
            RetryPolicy::from(&self.config.retry),
            Duration::from_secs(self.config.sync.cooldown),
        ));

        // Shared connectivity flag, optimistic until the first probe lands.
        let online = Arc::new(AtomicBool::new(true));
        let (signal_tx, signal_rx) = mpsc::channel::<SyncSignal>(16);

        tokio::spawn(connectivity_probe(
            Arc::clone(&backend),
            Arc::clone(&online),
            signal_tx,
            Duration::from_secs(self.config.sync.probe_interval),
            self.shutdown.clone(),
        ));

        let scheduler = AutoSync::new(
            engine,
            Arc::new(ProbeConnectivity { online }),
            self.shutdown.clone(),
        );
        scheduler.start(
            owner,
            Duration::from_secs(self.config.sync.interval),
            signal_rx,
        );

        info!(
            owner = %owner,
            interval_secs = self.config.sync.interval,
            "Shiftlog daemon running"
        );

        self.shutdown.cancelled().await;
        scheduler.stop();

        info!("Shiftlog daemon loop terminated");
        Ok(())
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    info!("Shiftlog daemon starting (shiftlogd)");

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(shutdown_token.clone()).await?;

    let result = service.run().await;

    match &result {
        Ok(()) => info!("Shiftlog daemon shut down gracefully"),
        Err(e) => error!(error = %e, "Shiftlog daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
