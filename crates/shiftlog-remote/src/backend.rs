//! IRemoteBackend implementation over the REST client
//!
//! Maps local records to the remote row shapes and applies the submission
//! policies that belong to this edge:
//!
//! - the local `id` and `created_at` are included in the payload, so a
//!   retry after a partially acknowledged insert hits the remote primary
//!   key instead of creating a second row;
//! - a duplicate-key rejection is therefore treated as success — the row
//!   is already there, which is what a successful sync would have left;
//! - incident records predating the `shift` column submit the first shift.
//!
//! ## Field Mapping
//!
//! | Local                   | Remote column  |
//! |-------------------------|----------------|
//! | `id`                    | `id`           |
//! | `created_at`            | `created_at`   |
//! | owner (argument)        | `user_id`      |
//! | kind-specific fields    | same name      |
//!
//! The `synced` flag is local bookkeeping and never leaves the device.

use tracing::debug;

use shiftlog_core::domain::newtypes::{OwnerId, Shift};
use shiftlog_core::domain::record::{Checklist, Incident, NonConformance, Syncable};
use shiftlog_core::ports::remote_backend::{IRemoteBackend, RemoteError};

use crate::client::RestClient;

/// Shift submitted for incident records that predate the shift field
const LEGACY_INCIDENT_SHIFT: Shift = Shift::First;

/// Port implementation submitting records to the REST store
pub struct RestBackend {
    client: RestClient,
}

impl RestBackend {
    /// Wraps a configured [`RestClient`]
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    /// Resolves the duplicate-key policy on an insert outcome
    ///
    /// The row already existing remotely is indistinguishable from a sync
    /// that succeeded moments ago, so it is reported as success.
    fn resolve_duplicate(result: Result<(), RemoteError>, id: &str) -> Result<(), RemoteError> {
        match result {
            Err(RemoteError::DuplicateKey(msg)) => {
                debug!(id, %msg, "Remote row already exists, treating as synced");
                Ok(())
            }
            other => other,
        }
    }
}

#[async_trait::async_trait]
impl IRemoteBackend for RestBackend {
    async fn submit_checklist(
        &self,
        record: &Checklist,
        owner: OwnerId,
    ) -> Result<(), RemoteError> {
        let row = serde_json::json!({
            "id": record.id().as_str(),
            "shift": record.shift().number(),
            "date": record.date().format("%Y-%m-%d").to_string(),
            "items": record.items(),
            "notes": record.notes(),
            "operator": record.operator(),
            "user_id": owner.to_string(),
            "created_at": record.created_at().to_rfc3339(),
        });

        let result = self.client.insert("checklists", &row).await;
        Self::resolve_duplicate(result, record.id().as_str())
    }

    async fn submit_non_conformance(
        &self,
        record: &NonConformance,
        owner: OwnerId,
    ) -> Result<(), RemoteError> {
        let row = serde_json::json!({
            "id": record.id().as_str(),
            "kind": record.kind(),
            "description": record.description(),
            "location": record.location(),
            "shift": record.shift().number(),
            "photo": record.photo(),
            "date": record.date().format("%Y-%m-%d").to_string(),
            "operator": record.operator(),
            "user_id": owner.to_string(),
            "created_at": record.created_at().to_rfc3339(),
        });

        let result = self.client.insert("non_conformances", &row).await;
        Self::resolve_duplicate(result, record.id().as_str())
    }

    async fn submit_incident(
        &self,
        record: &Incident,
        owner: OwnerId,
    ) -> Result<(), RemoteError> {
        // Older records carry no shift; submit the policy default.
        let shift = record.shift().unwrap_or(LEGACY_INCIDENT_SHIFT);

        let row = serde_json::json!({
            "id": record.id().as_str(),
            "kind": record.kind().label(),
            "shift": shift.number(),
            "sector": record.sector(),
            "description": record.description(),
            "cause": record.cause(),
            "involved": record.involved(),
            "photo": record.photo(),
            "date": record.date().format("%Y-%m-%d").to_string(),
            "time": record.time().format("%H:%M:%S").to_string(),
            "operator": record.operator(),
            "user_id": owner.to_string(),
            "created_at": record.created_at().to_rfc3339(),
        });

        let result = self.client.insert("incidents", &row).await;
        Self::resolve_duplicate(result, record.id().as_str())
    }

    async fn health_check(&self) -> Result<(), RemoteError> {
        self.client.health_check().await
    }
}

// ============================================================================
// Tests
// ============================================================================
