//! Record creation use case
//!
//! The single inbound edge from the UI forms: takes the raw field set of a
//! form submission, assigns the record its identity (`<kind>-<millis>`),
//! stamps `created_at`, forces `synced = false` and hands the record to the
//! local store. A duplicate-id rejection from the store propagates to the
//! caller; the form layer must not resubmit with the same id.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::domain::newtypes::{RecordId, Shift};
use crate::domain::record::{
    Checklist, ChecklistItem, Incident, IncidentKind, NonConformance, RecordKind,
};
use crate::ports::record_store::{IRecordStore, StoreError};

// ============================================================================
// Form input DTOs
// ============================================================================

/// Field set of a checklist form submission
#[derive(Debug, Clone)]
pub struct NewChecklist {
    pub shift: Shift,
    pub date: NaiveDate,
    pub items: Vec<ChecklistItem>,
    pub notes: Option<String>,
    pub operator: String,
}

/// Field set of a non-conformance form submission
#[derive(Debug, Clone)]
pub struct NewNonConformance {
    pub kind: String,
    pub description: String,
    pub location: String,
    pub shift: Shift,
    pub photo: Option<String>,
    pub date: NaiveDate,
    pub operator: String,
}

/// Field set of an incident form submission
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub kind: IncidentKind,
    pub sector: String,
    pub description: String,
    pub cause: Option<String>,
    pub involved: Option<String>,
    pub photo: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub operator: String,
    pub shift: Option<Shift>,
}

// ============================================================================
// AddRecordUseCase
// ============================================================================

/// Use case for queueing a freshly captured record
pub struct AddRecordUseCase {
    store: Arc<dyn IRecordStore>,
}

impl AddRecordUseCase {
    /// Creates the use case over the injected store port
    pub fn new(store: Arc<dyn IRecordStore>) -> Self {
        Self { store }
    }

    /// Queues a checklist; returns the stored record with its assigned id
    pub async fn add_checklist(&self, input: NewChecklist) -> Result<Checklist, StoreError> {
        let (id, created_at) = Self::identity(RecordKind::Checklist);
        let record = Checklist::new(
            id,
            input.shift,
            input.date,
            input.items,
            input.notes,
            input.operator,
            created_at,
        );
        self.store.add_checklist(&record).await?;
        Ok(record)
    }

    /// Queues a non-conformance; returns the stored record with its assigned id
    pub async fn add_non_conformance(
        &self,
        input: NewNonConformance,
    ) -> Result<NonConformance, StoreError> {
        let (id, created_at) = Self::identity(RecordKind::NonConformance);
        let record = NonConformance::new(
            id,
            input.kind,
            input.description,
            input.location,
            input.shift,
            input.photo,
            input.date,
            input.operator,
            created_at,
        );
        self.store.add_non_conformance(&record).await?;
        Ok(record)
    }

    /// Queues an incident report; returns the stored record with its assigned id
    pub async fn add_incident(&self, input: NewIncident) -> Result<Incident, StoreError> {
        let (id, created_at) = Self::identity(RecordKind::Incident);
        let record = Incident::new(
            id,
            input.kind,
            input.sector,
            input.description,
            input.cause,
            input.involved,
            input.photo,
            input.date,
            input.time,
            input.operator,
            input.shift,
            created_at,
        );
        self.store.add_incident(&record).await?;
        Ok(record)
    }

    fn identity(kind: RecordKind) -> (RecordId, DateTime<Utc>) {
        let now = Utc::now();
        (kind.new_id(now), now)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Syncable;
    use crate::domain::newtypes::RecordId;
    use crate::ports::record_store::StoreError;
    use std::sync::Mutex;

    /// Store double that records added ids and can simulate duplicates
    #[derive(Default)]
    struct RecordingStore {
        checklist_ids: Mutex<Vec<String>>,
        reject_duplicates: bool,
    }

    #[async_trait::async_trait]
    impl IRecordStore for RecordingStore {
        async fn add_checklist(&self, record: &Checklist) -> Result<(), StoreError> {
            let mut ids = self.checklist_ids.lock().unwrap();
            let id = record.id().as_str().to_string();
            if self.reject_duplicates && ids.contains(&id) {
                return Err(StoreError::DuplicateId(record.id().clone()));
            }
            ids.push(id);
            Ok(())
        }

        async fn get_checklists(&self) -> Result<Vec<Checklist>, StoreError> {
            Ok(Vec::new())
        }

        async fn get_checklists_by_date(
            &self,
            _date: NaiveDate,
        ) -> Result<Vec<Checklist>, StoreError> {
            Ok(Vec::new())
        }

        async fn get_checklists_by_shift(
            &self,
            _shift: Shift,
        ) -> Result<Vec<Checklist>, StoreError> {
            Ok(Vec::new())
        }

        async fn get_pending_checklists(&self) -> Result<Vec<Checklist>, StoreError> {
            Ok(Vec::new())
        }

        async fn add_non_conformance(&self, _record: &NonConformance) -> Result<(), StoreError> {
            Ok(())
        }

        async fn get_non_conformances(&self) -> Result<Vec<NonConformance>, StoreError> {
            Ok(Vec::new())
        }

        async fn get_non_conformances_by_date(
            &self,
            _date: NaiveDate,
        ) -> Result<Vec<NonConformance>, StoreError> {
            Ok(Vec::new())
        }

        async fn get_pending_non_conformances(&self) -> Result<Vec<NonConformance>, StoreError> {
            Ok(Vec::new())
        }

        async fn add_incident(&self, _record: &Incident) -> Result<(), StoreError> {
            Ok(())
        }

        async fn get_incidents(&self) -> Result<Vec<Incident>, StoreError> {
            Ok(Vec::new())
        }

        async fn get_incidents_by_date(
            &self,
            _date: NaiveDate,
        ) -> Result<Vec<Incident>, StoreError> {
            Ok(Vec::new())
        }

        async fn get_incidents_by_kind(
            &self,
            _kind: IncidentKind,
        ) -> Result<Vec<Incident>, StoreError> {
            Ok(Vec::new())
        }

        async fn get_pending_incidents(&self) -> Result<Vec<Incident>, StoreError> {
            Ok(Vec::new())
        }

        async fn mark_synced(
            &self,
            _kind: RecordKind,
            _id: &RecordId,
        ) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn checklist_input() -> NewChecklist {
        NewChecklist {
            shift: Shift::Second,
            date: NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            items: vec![ChecklistItem {
                question: "Emergency stop reachable?".to_string(),
                answer: true,
            }],
            notes: None,
            operator: "A. Ferreira".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_checklist_assigns_prefixed_id_and_pending_flag() {
        let store = Arc::new(RecordingStore::default());
        let use_case = AddRecordUseCase::new(store.clone());

        let record = use_case.add_checklist(checklist_input()).await.unwrap();

        assert!(record.id().as_str().starts_with("checklist-"));
        assert!(!record.is_synced());
        assert_eq!(store.checklist_ids.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_incident_assigns_identity() {
        let use_case = AddRecordUseCase::new(Arc::new(RecordingStore::default()));

        let record = use_case
            .add_incident(NewIncident {
                kind: IncidentKind::NearMiss,
                sector: "assembly".to_string(),
                description: "forklift reversed without spotter".to_string(),
                cause: None,
                involved: None,
                photo: None,
                date: NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
                time: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
                operator: "R. Lopes".to_string(),
                shift: Some(Shift::First),
            })
            .await
            .unwrap();

        assert!(record.id().as_str().starts_with("incident-"));
        assert!(!record.is_synced());
    }

    #[tokio::test]
    async fn test_duplicate_id_propagates_to_caller() {
        let store = Arc::new(RecordingStore {
            checklist_ids: Mutex::new(Vec::new()),
            reject_duplicates: true,
        });
        let use_case = AddRecordUseCase::new(store.clone());

        let record = use_case.add_checklist(checklist_input()).await.unwrap();

        // Resubmitting the same record collides on the id.
        let result = store.add_checklist(&record).await;
        assert!(matches!(result, Err(StoreError::DuplicateId(_))));
    }
}
