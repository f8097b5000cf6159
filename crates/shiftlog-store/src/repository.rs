//! SQLite implementation of IRecordStore
//!
//! This module provides the concrete SQLite-based implementation of the
//! record store port defined in shiftlog-core. It handles all domain type
//! serialization/deserialization and SQL query construction.
//!
//! ## Type Mapping
//!
//! | Domain Type        | SQL Type | Strategy                                  |
//! |--------------------|----------|-------------------------------------------|
//! | RecordId           | TEXT     | String via `.as_str()` / `RecordId::new()`|
//! | Shift              | INTEGER  | Shift number 1..=3                        |
//! | IncidentKind       | TEXT     | Label via `.label()` / `FromStr`          |
//! | NaiveDate          | TEXT     | `%Y-%m-%d`                                |
//! | NaiveTime          | TEXT     | `%H:%M:%S`                                |
//! | DateTime<Utc>      | TEXT     | ISO 8601 via `to_rfc3339()`               |
//! | Vec<ChecklistItem> | TEXT     | serde_json array                          |
//! | synced             | INTEGER  | 0 / 1                                     |
//!
//! Records are reconstructed from rows through serde deserialization: the
//! entities keep their fields private so that `synced` can only move
//! through the guarded `mark_synced` path, and serde is the one sanctioned
//! back door for rehydration.

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use shiftlog_core::domain::{
    newtypes::{RecordId, Shift},
    record::{Checklist, Incident, IncidentKind, NonConformance, RecordKind, Syncable},
};
use shiftlog_core::ports::record_store::{IRecordStore, StoreError};

/// SQLite-based implementation of the record store port
///
/// Provides durable storage for the three record collections. All
/// operations go through a connection pool for concurrency.
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Creates a new store instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

/// Format used for the date columns
const DATE_FMT: &str = "%Y-%m-%d";

/// Format used for the incident time column
const TIME_FMT: &str = "%H:%M:%S";

/// Maps an insert failure, detecting primary-key collisions
fn map_insert_error(e: sqlx::Error, id: &RecordId) -> StoreError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return StoreError::DuplicateId(id.clone());
        }
    }
    StoreError::QueryFailed(e.to_string())
}

/// Maps a plain query failure
fn map_query_error(e: sqlx::Error) -> StoreError {
    StoreError::QueryFailed(e.to_string())
}

/// Table name for a record kind (used by the shared `mark_synced`)
fn table_for(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Checklist => "checklists",
        RecordKind::NonConformance => "non_conformances",
        RecordKind::Incident => "incidents",
    }
}

// ============================================================================
// Row mapping functions
// ============================================================================

/// Reconstruct a Checklist from a database row
///
/// Builds the serde JSON representation and deserializes, since the entity
/// has private fields that can only be set through constructors or
/// deserialization.
fn checklist_from_row(row: &SqliteRow) -> Result<Checklist, StoreError> {
    let items_str: String = row.get("items");
    let items: serde_json::Value = serde_json::from_str(&items_str)
        .map_err(|e| StoreError::Serialization(format!("Invalid items JSON: {}", e)))?;

    let notes: Option<String> = row.get("notes");
    let synced: i64 = row.get("synced");

    let value = serde_json::json!({
        "id": row.get::<String, _>("id"),
        "shift": row.get::<i64, _>("shift"),
        "date": row.get::<String, _>("date"),
        "items": items,
        "notes": notes,
        "operator": row.get::<String, _>("operator"),
        "created_at": row.get::<String, _>("created_at"),
        "synced": synced != 0,
    });

    serde_json::from_value(value)
        .map_err(|e| StoreError::Serialization(format!("Invalid checklist row: {}", e)))
}

/// Reconstruct a NonConformance from a database row
fn non_conformance_from_row(row: &SqliteRow) -> Result<NonConformance, StoreError> {
    let photo: Option<String> = row.get("photo");
    let synced: i64 = row.get("synced");

    let value = serde_json::json!({
        "id": row.get::<String, _>("id"),
        "kind": row.get::<String, _>("kind"),
        "description": row.get::<String, _>("description"),
        "location": row.get::<String, _>("location"),
        "shift": row.get::<i64, _>("shift"),
        "photo": photo,
        "date": row.get::<String, _>("date"),
        "operator": row.get::<String, _>("operator"),
        "created_at": row.get::<String, _>("created_at"),
        "synced": synced != 0,
    });

    serde_json::from_value(value)
        .map_err(|e| StoreError::Serialization(format!("Invalid non-conformance row: {}", e)))
}

/// Reconstruct an Incident from a database row
///
/// The `shift` column is nullable: rows written before the column existed
/// carry NULL and deserialize to `None`.
fn incident_from_row(row: &SqliteRow) -> Result<Incident, StoreError> {
    let cause: Option<String> = row.get("cause");
    let involved: Option<String> = row.get("involved");
    let photo: Option<String> = row.get("photo");
    let shift: Option<i64> = row.get("shift");
    let synced: i64 = row.get("synced");

    let value = serde_json::json!({
        "id": row.get::<String, _>("id"),
        "kind": row.get::<String, _>("kind"),
        "sector": row.get::<String, _>("sector"),
        "description": row.get::<String, _>("description"),
        "cause": cause,
        "involved": involved,
        "photo": photo,
        "date": row.get::<String, _>("date"),
        "time": row.get::<String, _>("time"),
        "operator": row.get::<String, _>("operator"),
        "shift": shift,
        "created_at": row.get::<String, _>("created_at"),
        "synced": synced != 0,
    });

    serde_json::from_value(value)
        .map_err(|e| StoreError::Serialization(format!("Invalid incident row: {}", e)))
}

// ============================================================================
// IRecordStore implementation
// ============================================================================

#[async_trait::async_trait]
impl IRecordStore for SqliteRecordStore {
    // --- Checklists ---

    async fn add_checklist(&self, record: &Checklist) -> Result<(), StoreError> {
        let items = serde_json::to_string(record.items())
            .map_err(|e| StoreError::Serialization(format!("Failed to encode items: {}", e)))?;

        // synced is forced to 0 on insert regardless of the record's flag.
        sqlx::query(
            "INSERT INTO checklists (id, shift, date, items, notes, operator, created_at, synced)
             VALUES (?, ?, ?, ?, ?, ?, ?, 0)",
        )
        .bind(record.id().as_str())
        .bind(i64::from(record.shift().number()))
        .bind(record.date().format(DATE_FMT).to_string())
        .bind(items)
        .bind(record.notes())
        .bind(record.operator())
        .bind(record.created_at().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, record.id()))?;

        Ok(())
    }

    async fn get_checklists(&self) -> Result<Vec<Checklist>, StoreError> {
        let rows = sqlx::query("SELECT * FROM checklists")
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_error)?;

        rows.iter().map(checklist_from_row).collect()
    }

    async fn get_checklists_by_date(&self, date: NaiveDate) -> Result<Vec<Checklist>, StoreError> {
        let rows = sqlx::query("SELECT * FROM checklists WHERE date = ?")
            .bind(date.format(DATE_FMT).to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_error)?;

        rows.iter().map(checklist_from_row).collect()
    }

    async fn get_checklists_by_shift(&self, shift: Shift) -> Result<Vec<Checklist>, StoreError> {
        let rows = sqlx::query("SELECT * FROM checklists WHERE shift = ?")
            .bind(i64::from(shift.number()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_error)?;

        rows.iter().map(checklist_from_row).collect()
    }

    async fn get_pending_checklists(&self) -> Result<Vec<Checklist>, StoreError> {
        let rows = sqlx::query("SELECT * FROM checklists WHERE synced = 0")
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_error)?;

        rows.iter().map(checklist_from_row).collect()
    }

    // --- Non-conformances ---

    async fn add_non_conformance(&self, record: &NonConformance) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO non_conformances
                 (id, kind, description, location, shift, photo, date, operator, created_at, synced)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0)",
        )
        .bind(record.id().as_str())
        .bind(record.kind())
        .bind(record.description())
        .bind(record.location())
        .bind(i64::from(record.shift().number()))
        .bind(record.photo())
        .bind(record.date().format(DATE_FMT).to_string())
        .bind(record.operator())
        .bind(record.created_at().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, record.id()))?;

        Ok(())
    }

    async fn get_non_conformances(&self) -> Result<Vec<NonConformance>, StoreError> {
        let rows = sqlx::query("SELECT * FROM non_conformances")
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_error)?;

        rows.iter().map(non_conformance_from_row).collect()
    }

    async fn get_non_conformances_by_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<NonConformance>, StoreError> {
        let rows = sqlx::query("SELECT * FROM non_conformances WHERE date = ?")
            .bind(date.format(DATE_FMT).to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_error)?;

        rows.iter().map(non_conformance_from_row).collect()
    }

    async fn get_pending_non_conformances(&self) -> Result<Vec<NonConformance>, StoreError> {
        let rows = sqlx::query("SELECT * FROM non_conformances WHERE synced = 0")
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_error)?;

        rows.iter().map(non_conformance_from_row).collect()
    }

    // --- Incidents ---

    async fn add_incident(&self, record: &Incident) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO incidents
                 (id, kind, sector, description, cause, involved, photo, date, time,
                  operator, shift, created_at, synced)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)",
        )
        .bind(record.id().as_str())
        .bind(record.kind().label())
        .bind(record.sector())
        .bind(record.description())
        .bind(record.cause())
        .bind(record.involved())
        .bind(record.photo())
        .bind(record.date().format(DATE_FMT).to_string())
        .bind(record.time().format(TIME_FMT).to_string())
        .bind(record.operator())
        .bind(record.shift().map(|s| i64::from(s.number())))
        .bind(record.created_at().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, record.id()))?;

        Ok(())
    }

    async fn get_incidents(&self) -> Result<Vec<Incident>, StoreError> {
        let rows = sqlx::query("SELECT * FROM incidents")
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_error)?;

        rows.iter().map(incident_from_row).collect()
    }

    async fn get_incidents_by_date(&self, date: NaiveDate) -> Result<Vec<Incident>, StoreError> {
        let rows = sqlx::query("SELECT * FROM incidents WHERE date = ?")
            .bind(date.format(DATE_FMT).to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_error)?;

        rows.iter().map(incident_from_row).collect()
    }

    async fn get_incidents_by_kind(
        &self,
        kind: IncidentKind,
    ) -> Result<Vec<Incident>, StoreError> {
        let rows = sqlx::query("SELECT * FROM incidents WHERE kind = ?")
            .bind(kind.label())
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_error)?;

        rows.iter().map(incident_from_row).collect()
    }

    async fn get_pending_incidents(&self) -> Result<Vec<Incident>, StoreError> {
        let rows = sqlx::query("SELECT * FROM incidents WHERE synced = 0")
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_error)?;

        rows.iter().map(incident_from_row).collect()
    }

    // --- Shared ---

    async fn mark_synced(&self, kind: RecordKind, id: &RecordId) -> Result<(), StoreError> {
        let sql = format!("UPDATE {} SET synced = 1 WHERE id = ?", table_for(kind));
        let result = sqlx::query(&sql)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_query_error)?;

        if result.rows_affected() == 0 {
            // The record was removed between the pending fetch and this
            // acknowledgement; nothing to do.
            tracing::debug!(kind = %kind, id = %id, "mark_synced on missing record, skipping");
        }

        Ok(())
    }
}
