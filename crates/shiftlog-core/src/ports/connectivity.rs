//! Connectivity monitor port (driven/secondary port)
//!
//! Abstracts the ambient "is the device online" signal behind an injected
//! capability instead of a global environment query, so the scheduler can
//! be tested with a scripted monitor.
//!
//! The *event* side of connectivity (a recovery should trigger an
//! immediate sync pass) is not part of this port: implementations feed
//! offline-to-online transitions into the scheduler's signal channel.

/// Port trait for the device connectivity signal
pub trait IConnectivityMonitor: Send + Sync {
    /// Best-effort answer to "can we reach the remote store right now?"
    ///
    /// A `true` here is advisory: a submission may still fail with a
    /// network error, which the retry engine handles.
    fn is_online(&self) -> bool;
}
