//! Integration tests for the REST backend
//!
//! Verifies end-to-end submission behavior against a wiremock-based mock
//! of the remote store: payload shapes, status classification, and the
//! duplicate-key-is-success policy.

use chrono::{NaiveDate, NaiveTime, Utc};
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shiftlog_core::domain::newtypes::{OwnerId, RecordId, Shift};
use shiftlog_core::domain::record::{Checklist, ChecklistItem, Incident, IncidentKind};
use shiftlog_core::ports::remote_backend::{IRemoteBackend, RemoteError};
use shiftlog_remote::{RestBackend, RestClient};

// ============================================================================
// Test helpers
// ============================================================================

fn backend_for(server: &MockServer) -> RestBackend {
    RestBackend::new(RestClient::new(server.uri(), Some("test-key".to_string())))
}

fn sample_checklist() -> Checklist {
    Checklist::new(
        RecordId::new("checklist-1754445600000").unwrap(),
        Shift::Second,
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
        vec![ChecklistItem {
            question: "Extinguishers charged?".to_string(),
            answer: true,
        }],
        None,
        "M. Silva",
        Utc::now(),
    )
}

fn legacy_incident() -> Incident {
    Incident::new(
        RecordId::new("incident-1700000000000").unwrap(),
        IncidentKind::NearMiss,
        "assembly",
        "pallet fell from rack",
        None,
        None,
        None,
        NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
        "J. Costa",
        None, // predates the shift field
        Utc::now(),
    )
}

// ============================================================================
// Successful submission
// ============================================================================

#[tokio::test]
async fn test_submit_checklist_posts_mapped_row() {
    let server = MockServer::start().await;
    let owner = OwnerId::new();

    Mock::given(method("POST"))
        .and(path("/checklists"))
        .and(header_exists("apikey"))
        .and(body_partial_json(serde_json::json!({
            "id": "checklist-1754445600000",
            "shift": 2,
            "date": "2026-08-06",
            "operator": "M. Silva",
            "user_id": owner.to_string(),
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    backend
        .submit_checklist(&sample_checklist(), owner)
        .await
        .expect("Submission failed");
}

#[tokio::test]
async fn test_submit_incident_defaults_legacy_shift() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/incidents"))
        .and(body_partial_json(serde_json::json!({
            "kind": "near-miss",
            "shift": 1,
            "time": "09:15:00",
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    backend
        .submit_incident(&legacy_incident(), OwnerId::new())
        .await
        .expect("Legacy incident submission failed");
}

// ============================================================================
// Duplicate-key policy
// ============================================================================

#[tokio::test]
async fn test_conflict_treated_as_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/checklists"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"checklists_pkey\""
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let result = backend.submit_checklist(&sample_checklist(), OwnerId::new()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_sqlstate_duplicate_in_400_treated_as_success() {
    let server = MockServer::start().await;

    // PostgREST reports unique violations as 400 + SQLSTATE 23505.
    Mock::given(method("POST"))
        .and(path("/incidents"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"incidents_pkey\""
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let result = backend.submit_incident(&legacy_incident(), OwnerId::new()).await;
    assert!(result.is_ok());
}

// ============================================================================
// Error classification
// ============================================================================

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/checklists"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "message": "database is starting up"
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend
        .submit_checklist(&sample_checklist(), OwnerId::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Server { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_validation_error_is_terminal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/checklists"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": "22007",
            "message": "invalid input syntax for type date"
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend
        .submit_checklist(&sample_checklist(), OwnerId::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Rejected { status: 400, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_rate_limit_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/checklists"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend
        .submit_checklist(&sample_checklist(), OwnerId::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::RateLimited(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_auth_failure_is_terminal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/checklists"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "invalid service key"
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend
        .submit_checklist(&sample_checklist(), OwnerId::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Auth { status: 401, .. }));
    assert!(!err.is_retryable());
}

// ============================================================================
// Health check
// ============================================================================

#[tokio::test]
async fn test_health_check_reaches_base_url() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    backend.health_check().await.expect("Health check failed");
}
