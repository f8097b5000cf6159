//! REST client for the remote record store
//!
//! Provides a thin typed HTTP client over `reqwest`. Handles header
//! construction, endpoint URLs and the mapping from transport/status
//! failures to the [`RemoteError`] categories the retry engine consumes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use shiftlog_remote::client::RestClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = RestClient::new("https://records.example.com", Some("service-key".to_string()));
//! client.health_check().await?;
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use shiftlog_core::ports::remote_backend::RemoteError;

/// SQLSTATE code PostgreSQL uses for unique-constraint violations
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

// ============================================================================
// Error body
// ============================================================================

/// Error payload returned by the remote store
///
/// PostgREST-style: a SQLSTATE or application code plus a message. Both
/// fields are optional because proxies and load balancers occasionally
/// answer with bare-status bodies.
#[derive(Debug, Deserialize, Default)]
struct ErrorBody {
    /// SQLSTATE or application-level error code
    code: Option<String>,
    /// Human-readable error message
    message: Option<String>,
}

// ============================================================================
// RestClient
// ============================================================================

/// HTTP client for the remote record store
///
/// Wraps `reqwest::Client` with the base URL and authentication headers.
/// One instance is shared across the whole process; `reqwest` pools
/// connections internally.
pub struct RestClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL of the remote store (no trailing slash)
    base_url: String,
    /// Service key sent as both `apikey` and bearer token, when configured
    service_key: Option<String>,
}

impl RestClient {
    /// Creates a new RestClient for the given base URL
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the remote store
    /// * `service_key` - Service key for authentication, if provisioned
    pub fn new(base_url: impl Into<String>, service_key: Option<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
            service_key,
        }
    }

    /// Inserts one row into `table`
    ///
    /// Exactly one POST per call; retrying is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns a classified [`RemoteError`]; see [`classify_status`] for
    /// the status mapping.
    pub async fn insert(
        &self,
        table: &str,
        row: &serde_json::Value,
    ) -> Result<(), RemoteError> {
        let url = format!("{}/{}", self.base_url, table);
        debug!(table, "Submitting record to remote store");

        let mut request = self.client.post(&url).json(row);
        if let Some(ref key) = self.service_key {
            request = request.header("apikey", key.as_str()).bearer_auth(key);
        }

        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(classify_status(status, read_error_body(response).await))
    }

    /// Cheap reachability probe: HEAD against the base URL
    ///
    /// Any HTTP answer counts as reachable; only transport-level failures
    /// surface as errors.
    pub async fn health_check(&self) -> Result<(), RemoteError> {
        self.client
            .head(&self.base_url)
            .send()
            .await
            .map(|_| ())
            .map_err(map_transport_error)
    }

    /// Returns the configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

// ============================================================================
// Error mapping
// ============================================================================

/// Maps a reqwest transport failure to a RemoteError
fn map_transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout(e.to_string())
    } else {
        RemoteError::Network(e.to_string())
    }
}

/// Drains the response body into an ErrorBody, tolerating junk
async fn read_error_body(response: Response) -> ErrorBody {
    response.json::<ErrorBody>().await.unwrap_or_default()
}

/// Maps an HTTP error status (plus its body) to a RemoteError category
///
/// - 429 → `RateLimited`
/// - 5xx → `Server`
/// - 401/403 → `Auth`
/// - 409, or any 4xx whose body carries SQLSTATE 23505 → `DuplicateKey`
/// - remaining 4xx → `Rejected`
fn classify_status(status: StatusCode, body: ErrorBody) -> RemoteError {
    let message = body
        .message
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

    if status == StatusCode::TOO_MANY_REQUESTS {
        return RemoteError::RateLimited(message);
    }
    if status.is_server_error() {
        return RemoteError::Server {
            status: status.as_u16(),
            message,
        };
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return RemoteError::Auth {
            status: status.as_u16(),
            message,
        };
    }
    if status == StatusCode::CONFLICT
        || body.code.as_deref() == Some(SQLSTATE_UNIQUE_VIOLATION)
    {
        return RemoteError::DuplicateKey(message);
    }
    RemoteError::Rejected {
        status: status.as_u16(),
        message,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn body(code: Option<&str>, message: &str) -> ErrorBody {
        ErrorBody {
            code: code.map(str::to_string),
            message: Some(message.to_string()),
        }
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, body(None, "slow down"));
        assert_eq!(err, RemoteError::RateLimited("slow down".to_string()));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_server_errors() {
        for status in [500u16, 502, 503, 504] {
            let err = classify_status(
                StatusCode::from_u16(status).unwrap(),
                body(None, "upstream sad"),
            );
            assert!(matches!(err, RemoteError::Server { status: s, .. } if s == status));
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn test_classify_auth() {
        let err = classify_status(StatusCode::UNAUTHORIZED, body(None, "bad key"));
        assert!(matches!(err, RemoteError::Auth { status: 401, .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classify_conflict_as_duplicate() {
        let err = classify_status(StatusCode::CONFLICT, body(None, "already there"));
        assert!(matches!(err, RemoteError::DuplicateKey(_)));
    }

    #[test]
    fn test_classify_sqlstate_unique_violation_as_duplicate() {
        // PostgREST reports unique violations as 400 with SQLSTATE 23505.
        let err = classify_status(
            StatusCode::BAD_REQUEST,
            body(Some("23505"), "duplicate key value violates unique constraint"),
        );
        assert!(matches!(err, RemoteError::DuplicateKey(_)));
    }

    #[test]
    fn test_classify_validation_as_rejected() {
        let err = classify_status(StatusCode::BAD_REQUEST, body(Some("22007"), "bad date"));
        assert!(matches!(err, RemoteError::Rejected { status: 400, .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RestClient::new("https://records.example.com/", None);
        assert_eq!(client.base_url(), "https://records.example.com");
    }
}
