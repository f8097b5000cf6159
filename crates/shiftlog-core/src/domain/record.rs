//! Syncable record entities
//!
//! This module defines the three record kinds captured on the shop floor —
//! checklists, non-conformances and incident reports — together with the
//! synchronization envelope they all share.
//!
//! ## Synchronization contract
//!
//! ```text
//!     ┌───────────────┐    remote insert ok    ┌──────────────┐
//!     │ synced=false  │ ─────────────────────► │ synced=true  │
//!     │  (pending)    │                        │  (terminal)  │
//!     └───────────────┘                        └──────────────┘
//! ```
//!
//! The `id` is immutable once created, and `synced` transitions only
//! `false → true`, never back. Records are never deleted by the sync
//! subsystem. The three kinds are independent aggregates: no foreign keys
//! between them, only the shared contract above.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::newtypes::{RecordId, Shift};

// ============================================================================
// RecordKind
// ============================================================================

/// The three kinds of syncable records
///
/// Each kind lives in its own store collection and its own remote table;
/// the slug doubles as the id prefix and as the `kind` field in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    Checklist,
    NonConformance,
    Incident,
}

impl RecordKind {
    /// Stable slug used in ids and structured log fields
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            RecordKind::Checklist => "checklist",
            RecordKind::NonConformance => "non-conformance",
            RecordKind::Incident => "incident",
        }
    }

    /// Generates a fresh record id for this kind at the given instant
    ///
    /// The id is `<slug>-<unix-millis>`. Two submissions of the same kind in
    /// the same millisecond collide; the store rejects the second with a
    /// duplicate-id error and the form layer is responsible for retrying
    /// with a new id rather than resubmitting the old one.
    #[must_use]
    pub fn new_id(self, at: DateTime<Utc>) -> RecordId {
        RecordId::from_parts(self.slug(), at.timestamp_millis())
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

// ============================================================================
// Syncable
// ============================================================================

/// Shared synchronization envelope of all record kinds
///
/// The orchestrator only needs this much of a record: its identity, whether
/// it still awaits upload, and when it was captured. Domain payloads stay in
/// the concrete types.
pub trait Syncable {
    /// The record's immutable local identity
    fn id(&self) -> &RecordId;

    /// Whether the record has been acknowledged by the remote store
    fn is_synced(&self) -> bool;

    /// Capture timestamp, stamped at form submission
    fn created_at(&self) -> DateTime<Utc>;
}

// ============================================================================
// Checklist
// ============================================================================

/// A single question on a safety checklist, answered yes/no
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// The question text as printed on the checklist template
    pub question: String,
    /// The operator's answer
    pub answer: bool,
}

/// A completed per-shift safety checklist
///
/// The item list is fixed-length per template and order-preserving; the
/// store persists it verbatim as a JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    id: RecordId,
    shift: Shift,
    date: NaiveDate,
    items: Vec<ChecklistItem>,
    notes: Option<String>,
    operator: String,
    created_at: DateTime<Utc>,
    synced: bool,
}

impl Checklist {
    /// Creates a new pending checklist (`synced` starts false)
    pub fn new(
        id: RecordId,
        shift: Shift,
        date: NaiveDate,
        items: Vec<ChecklistItem>,
        notes: Option<String>,
        operator: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            shift,
            date,
            items,
            notes,
            operator: operator.into(),
            created_at,
            synced: false,
        }
    }

    pub fn shift(&self) -> Shift {
        self.shift
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Marks the record as acknowledged by the remote store
    ///
    /// Idempotent; there is no inverse operation.
    pub fn mark_synced(&mut self) {
        self.synced = true;
    }
}

impl Syncable for Checklist {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn is_synced(&self) -> bool {
        self.synced
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// ============================================================================
// NonConformance
// ============================================================================

/// A non-conformance observation (unsafe condition, missing guard, ...)
///
/// The `kind` field is free text: sites maintain their own taxonomies and
/// the remote store treats it as an opaque label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonConformance {
    id: RecordId,
    kind: String,
    description: String,
    location: String,
    shift: Shift,
    /// Optional photo as an opaque base64 data URI, captured on-device
    photo: Option<String>,
    date: NaiveDate,
    operator: String,
    created_at: DateTime<Utc>,
    synced: bool,
}

impl NonConformance {
    /// Creates a new pending non-conformance (`synced` starts false)
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RecordId,
        kind: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
        shift: Shift,
        photo: Option<String>,
        date: NaiveDate,
        operator: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind: kind.into(),
            description: description.into(),
            location: location.into(),
            shift,
            photo,
            date,
            operator: operator.into(),
            created_at,
            synced: false,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn shift(&self) -> Shift {
        self.shift
    }

    pub fn photo(&self) -> Option<&str> {
        self.photo.as_deref()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Marks the record as acknowledged by the remote store (idempotent)
    pub fn mark_synced(&mut self) {
        self.synced = true;
    }
}

impl Syncable for NonConformance {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn is_synced(&self) -> bool {
        self.synced
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// ============================================================================
// Incident
// ============================================================================

/// Severity classification of an incident report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncidentKind {
    /// An accident with actual harm or damage
    Accident,
    /// An incident without harm but with operational impact
    Incident,
    /// A near-miss: no harm, no impact, but worth recording
    NearMiss,
}

impl IncidentKind {
    /// Label used in the store index and the remote `kind` column
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            IncidentKind::Accident => "accident",
            IncidentKind::Incident => "incident",
            IncidentKind::NearMiss => "near-miss",
        }
    }
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for IncidentKind {
    type Err = super::errors::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accident" => Ok(IncidentKind::Accident),
            "incident" => Ok(IncidentKind::Incident),
            "near-miss" => Ok(IncidentKind::NearMiss),
            other => Err(super::errors::DomainError::InvalidIncidentKind(
                other.to_string(),
            )),
        }
    }
}

/// An incident report (accident, incident or near-miss)
///
/// `shift` was added to the schema after devices already held incident
/// records without it, so it stays optional here; submission substitutes
/// the first shift when absent (see the sync engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    id: RecordId,
    kind: IncidentKind,
    sector: String,
    description: String,
    cause: Option<String>,
    /// People involved, as entered on the form (raw free text)
    involved: Option<String>,
    photo: Option<String>,
    date: NaiveDate,
    time: NaiveTime,
    operator: String,
    #[serde(default)]
    shift: Option<Shift>,
    created_at: DateTime<Utc>,
    synced: bool,
}

impl Incident {
    /// Creates a new pending incident report (`synced` starts false)
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RecordId,
        kind: IncidentKind,
        sector: impl Into<String>,
        description: impl Into<String>,
        cause: Option<String>,
        involved: Option<String>,
        photo: Option<String>,
        date: NaiveDate,
        time: NaiveTime,
        operator: impl Into<String>,
        shift: Option<Shift>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            sector: sector.into(),
            description: description.into(),
            cause,
            involved,
            photo,
            date,
            time,
            operator: operator.into(),
            shift,
            created_at,
            synced: false,
        }
    }

    pub fn kind(&self) -> IncidentKind {
        self.kind
    }

    pub fn sector(&self) -> &str {
        &self.sector
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    pub fn involved(&self) -> Option<&str> {
        self.involved.as_deref()
    }

    pub fn photo(&self) -> Option<&str> {
        self.photo.as_deref()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// The shift, when the record is new enough to carry one
    pub fn shift(&self) -> Option<Shift> {
        self.shift
    }

    /// Marks the record as acknowledged by the remote store (idempotent)
    pub fn mark_synced(&mut self) {
        self.synced = true;
    }
}

impl Syncable for Incident {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn is_synced(&self) -> bool {
        self.synced
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// ============================================================================
// Tests
// ============================================================================
