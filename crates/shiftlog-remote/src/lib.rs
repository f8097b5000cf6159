//! Shiftlog Remote - REST submission client
//!
//! Implements the `IRemoteBackend` port from `shiftlog-core` against a
//! PostgREST-style HTTP store: one table per record kind, one POST per
//! record, a service key on every request.
//!
//! ## Key Components
//!
//! - [`RestClient`] - HTTP mechanics: URLs, headers, status classification
//! - [`RestBackend`] - Port implementation: field mapping and the
//!   duplicate-key-is-success policy

pub mod backend;
pub mod client;

pub use backend::RestBackend;
pub use client::RestClient;
