//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRecordStore`] - Durable local storage of the three record kinds
//! - [`IRemoteBackend`] - Remote submission of records (REST insert per kind)
//! - [`IConnectivityMonitor`] - Device online/offline signal

pub mod connectivity;
pub mod record_store;
pub mod remote_backend;

pub use connectivity::IConnectivityMonitor;
pub use record_store::{IRecordStore, StoreError};
pub use remote_backend::{IRemoteBackend, RemoteError};
