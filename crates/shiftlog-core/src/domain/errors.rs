//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures and malformed identifiers.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Record ID does not match the `<kind>-<timestamp>` format
    #[error("Invalid record ID: {0}")]
    InvalidRecordId(String),

    /// Owner ID is not a valid UUID
    #[error("Invalid owner ID: {0}")]
    InvalidOwnerId(String),

    /// Shift number outside the 1..=3 range
    #[error("Invalid shift number: {0} (expected 1, 2 or 3)")]
    InvalidShift(u8),

    /// Unknown incident kind label
    #[error("Unknown incident kind: {0}")]
    InvalidIncidentKind(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
