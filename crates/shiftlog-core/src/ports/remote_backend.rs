//! Remote backend port (driven/secondary port)
//!
//! This module defines the interface for submitting local records to the
//! remote store, one insert per record kind. The implementation maps local
//! field names to the remote row shape and attributes every row to the
//! authenticated owner.
//!
//! ## Design Notes
//!
//! - Errors carry a category, not just a message: the retry engine needs
//!   to classify a failure as transient or terminal without string
//!   matching, so the port owns [`RemoteError`] and its
//!   [`is_retryable`](RemoteError::is_retryable) classifier.
//! - A remote duplicate-key rejection is resolved *inside* the adapter by
//!   returning `Ok(())`: the row already exists remotely, which is exactly
//!   the state a successful sync would have produced. The
//!   [`RemoteError::DuplicateKey`] variant therefore never escapes a
//!   well-behaved `submit_*` call; it exists for the adapter's internal
//!   status mapping and its tests.
//! - Submission never mutates local state. Marking a record synced is the
//!   orchestrator's job.

use thiserror::Error;

use crate::domain::{
    newtypes::OwnerId,
    record::{Checklist, Incident, NonConformance},
};

// ============================================================================
// RemoteError
// ============================================================================

/// Classified failure of a remote submission
///
/// The variants partition the error space the way the retry engine needs:
/// `Network`, `Timeout`, `RateLimited` and `Server` are transient and worth
/// retrying; `Rejected` and `Auth` are terminal for the current pass;
/// `DuplicateKey` means the row already exists and the caller treats the
/// submission as a success.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Connection-level failure (DNS, refused, reset, offline)
    #[error("Network error: {0}")]
    Network(String),

    /// The request timed out at the transport layer
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// HTTP 429 from the remote store
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Server-side failure (HTTP 5xx)
    #[error("Server error ({status}): {message}")]
    Server {
        /// The HTTP status code (500..=599)
        status: u16,
        /// Error message from the response body, if any
        message: String,
    },

    /// The remote store rejected the row (validation, HTTP 4xx other than
    /// 401/403/409/429)
    #[error("Rejected ({status}): {message}")]
    Rejected {
        /// The HTTP status code
        status: u16,
        /// Error message from the response body, if any
        message: String,
    },

    /// Authentication or authorization failure (HTTP 401/403)
    #[error("Authentication failed ({status}): {message}")]
    Auth {
        /// The HTTP status code (401 or 403)
        status: u16,
        /// Error message from the response body, if any
        message: String,
    },

    /// The remote store already holds a row with this key (HTTP 409 or
    /// SQLSTATE 23505 in the error body)
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
}

impl RemoteError {
    /// Whether the retry engine should attempt this operation again
    ///
    /// Transient: network failures, timeouts, rate limiting, 5xx.
    /// Everything else is terminal for the current pass; the record stays
    /// pending and is retried on a future pass.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::Network(_)
                | RemoteError::Timeout(_)
                | RemoteError::RateLimited(_)
                | RemoteError::Server { .. }
        )
    }
}

// ============================================================================
// IRemoteBackend trait
// ============================================================================

/// Port trait for remote record submission
///
/// One method per record kind; each call performs exactly one remote
/// insert attempt. Retrying is the caller's concern.
#[async_trait::async_trait]
pub trait IRemoteBackend: Send + Sync {
    /// Submits one checklist, attributed to `owner`
    async fn submit_checklist(
        &self,
        record: &Checklist,
        owner: OwnerId,
    ) -> Result<(), RemoteError>;

    /// Submits one non-conformance, attributed to `owner`
    async fn submit_non_conformance(
        &self,
        record: &NonConformance,
        owner: OwnerId,
    ) -> Result<(), RemoteError>;

    /// Submits one incident, attributed to `owner`
    async fn submit_incident(&self, record: &Incident, owner: OwnerId)
        -> Result<(), RemoteError>;

    /// Cheap reachability probe against the remote store
    ///
    /// Used by the connectivity monitor; no side effects.
    async fn health_check(&self) -> Result<(), RemoteError>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(RemoteError::Network("connection refused".to_string()).is_retryable());
        assert!(RemoteError::Timeout("deadline elapsed".to_string()).is_retryable());
        assert!(RemoteError::RateLimited("slow down".to_string()).is_retryable());
        assert!(RemoteError::Server {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_terminal_errors_are_not_retryable() {
        assert!(!RemoteError::Rejected {
            status: 400,
            message: "missing column".to_string()
        }
        .is_retryable());
        assert!(!RemoteError::Auth {
            status: 401,
            message: "bad key".to_string()
        }
        .is_retryable());
        assert!(!RemoteError::DuplicateKey("row exists".to_string()).is_retryable());
    }
}
