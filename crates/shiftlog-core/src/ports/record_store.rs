//! Record store port (driven/secondary port)
//!
//! This module defines the interface for persisting and querying the three
//! record collections. The store exclusively owns record identity and
//! persistence; everything else in the system borrows records transiently
//! and hands mutation requests back through this interface.
//!
//! ## Design Notes
//!
//! - Unlike most adapter errors, a duplicate local id is part of the port
//!   contract: the form layer must be able to tell it apart from an I/O
//!   failure, so the port carries a typed [`StoreError`] instead of
//!   `anyhow::Result`.
//! - `mark_synced` is deliberately a no-op when the record no longer
//!   exists: a compaction or manual cleanup may have removed it between
//!   the pending fetch and the acknowledgement write.
//! - There are no delete operations. Retention is out of scope for the
//!   sync subsystem.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{
    newtypes::{RecordId, Shift},
    record::{Checklist, Incident, IncidentKind, NonConformance, RecordKind},
};

// ============================================================================
// StoreError
// ============================================================================

/// Errors surfaced by record store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same id already exists in the collection
    #[error("Duplicate record id: {0}")]
    DuplicateId(RecordId),

    /// Failed to open or connect to the underlying storage
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A storage query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization or deserialization of a stored record failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ============================================================================
// IRecordStore trait
// ============================================================================

/// Port trait for durable local record storage
///
/// Three collections (checklists, non-conformances, incidents), each with
/// primary key `id` and secondary indexes on date, a kind-specific
/// attribute (shift for checklists, kind for incidents) and the `synced`
/// flag.
///
/// ## Implementation Notes
///
/// - `add_*` must force `synced = false` on insert regardless of the value
///   carried by the passed record.
/// - `get_*` reads return records unordered; callers sort as needed.
/// - `get_pending_*` returns exactly the records with `synced = false`.
#[async_trait::async_trait]
pub trait IRecordStore: Send + Sync {
    // --- Checklists ---

    /// Inserts a new checklist; fails with [`StoreError::DuplicateId`] if
    /// the id already exists.
    async fn add_checklist(&self, record: &Checklist) -> Result<(), StoreError>;

    /// Returns all checklists, unordered
    async fn get_checklists(&self) -> Result<Vec<Checklist>, StoreError>;

    /// Returns checklists for an exact date
    async fn get_checklists_by_date(&self, date: NaiveDate) -> Result<Vec<Checklist>, StoreError>;

    /// Returns checklists for an exact shift
    async fn get_checklists_by_shift(&self, shift: Shift) -> Result<Vec<Checklist>, StoreError>;

    /// Returns all checklists with `synced = false`
    async fn get_pending_checklists(&self) -> Result<Vec<Checklist>, StoreError>;

    // --- Non-conformances ---

    /// Inserts a new non-conformance; fails with [`StoreError::DuplicateId`]
    /// if the id already exists.
    async fn add_non_conformance(&self, record: &NonConformance) -> Result<(), StoreError>;

    /// Returns all non-conformances, unordered
    async fn get_non_conformances(&self) -> Result<Vec<NonConformance>, StoreError>;

    /// Returns non-conformances for an exact date
    async fn get_non_conformances_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<NonConformance>, StoreError>;

    /// Returns all non-conformances with `synced = false`
    async fn get_pending_non_conformances(&self) -> Result<Vec<NonConformance>, StoreError>;

    // --- Incidents ---

    /// Inserts a new incident; fails with [`StoreError::DuplicateId`] if
    /// the id already exists.
    async fn add_incident(&self, record: &Incident) -> Result<(), StoreError>;

    /// Returns all incidents, unordered
    async fn get_incidents(&self) -> Result<Vec<Incident>, StoreError>;

    /// Returns incidents for an exact date
    async fn get_incidents_by_date(&self, date: NaiveDate) -> Result<Vec<Incident>, StoreError>;

    /// Returns incidents of an exact kind
    async fn get_incidents_by_kind(
        &self,
        kind: IncidentKind,
    ) -> Result<Vec<Incident>, StoreError>;

    /// Returns all incidents with `synced = false`
    async fn get_pending_incidents(&self) -> Result<Vec<Incident>, StoreError>;

    // --- Shared ---

    /// Sets `synced = true` on the record with the given id
    ///
    /// No-op (not an error) if the record no longer exists.
    async fn mark_synced(&self, kind: RecordKind, id: &RecordId) -> Result<(), StoreError>;
}
