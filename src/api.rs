//! Client for the rescue report API.
//!
//! Two endpoints matter: `POST /api/report` to file an emergency report and
//! `GET /api/health` for the connectivity indicator in the footer. Every
//! response body is wrapped in the `{ok, error?, report?}` envelope from
//! [`ReportResponse`].

use crate::config::ApiConfig;
use crate::models::{Report, ReportRecord, ReportResponse};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Rejection text used when the server gives none.
const GENERIC_REJECTION: &str = "An error occurred while sending the report";

/// Deadline for one health probe. Report submissions carry no deadline;
/// the POST waits for the server's verdict however long it takes.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a submission failed. `Display` is the user-facing sentence the
/// submit flow appends to its lead-in; the technical detail stays in the
/// variant for logs.
#[derive(Debug)]
pub enum ApiError {
    /// The request never completed (DNS failure, refused connection, reset).
    Network(reqwest::Error),
    /// The server answered and turned the report down.
    Rejected(String),
    /// The server answered with something that isn't a report envelope.
    Unexpected(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(_) => f.write_str(
                "Could not connect to the server. Please check your network connection and try again.",
            ),
            ApiError::Rejected(reason) => f.write_str(reason),
            ApiError::Unexpected(_) => f.write_str("Please try again later."),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network(e) => Some(e),
            _ => None,
        }
    }
}

/// Anything that can file a report. Production uses [`ReportClient`];
/// tests substitute scripted outcomes.
#[allow(async_fn_in_trait)]
pub trait ReportApi {
    async fn submit(&self, report: &Report) -> Result<Option<ReportRecord>, ApiError>;
}

#[derive(Clone)]
pub struct ReportClient {
    client: Client,
    base_url: String,
}

impl ReportClient {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Probes `GET /api/health`. Any 2xx counts as online.
    pub async fn health(&self) -> bool {
        let url = format!("{}/api/health", self.base_url);
        match self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) => {
                let online = response.status().is_success();
                if !online {
                    debug!("Health probe returned HTTP {}", response.status());
                }
                online
            }
            Err(e) => {
                debug!("Health probe failed: {}", e);
                false
            }
        }
    }
}

impl ReportApi for ReportClient {
    async fn submit(&self, report: &Report) -> Result<Option<ReportRecord>, ApiError> {
        let url = format!("{}/api/report", self.base_url);
        debug!("POST {} for phone {}", url, report.phone);

        let response = self
            .client
            .post(&url)
            .json(report)
            .send()
            .await
            .map_err(|e| {
                warn!("Report POST failed: {}", e);
                ApiError::Network(e)
            })?;

        let status = response.status();
        let body: ReportResponse = response.json().await.map_err(|e| {
            warn!("Report response unreadable (HTTP {}): {}", status, e);
            ApiError::Unexpected(format!("HTTP {status}: {e}"))
        })?;

        let outcome = interpret(status, body);
        if let Ok(Some(record)) = &outcome {
            info!(
                "Report {} accepted with status {}",
                record.id,
                record.status.as_deref().unwrap_or("unknown")
            );
        }
        outcome
    }
}

/// Applies the acceptance rule: the HTTP status and the envelope's `ok`
/// flag must both agree before a report counts as filed.
fn interpret(
    status: StatusCode,
    body: ReportResponse,
) -> Result<Option<ReportRecord>, ApiError> {
    if !status.is_success() || !body.ok {
        let reason = body
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| GENERIC_REJECTION.to_string());
        warn!("Report rejected (HTTP {}): {}", status, reason);
        return Err(ApiError::Rejected(reason));
    }
    Ok(body.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Severity;

    fn envelope(ok: bool, error: Option<&str>, report: Option<ReportRecord>) -> ReportResponse {
        ReportResponse {
            ok,
            error: error.map(str::to_string),
            report,
        }
    }

    fn record(id: &str) -> ReportRecord {
        ReportRecord {
            id: id.to_string(),
            status: Some("pending".to_string()),
            created_at: None,
        }
    }

    #[test]
    fn accepted_reports_pass_through() {
        let outcome = interpret(StatusCode::OK, envelope(true, None, Some(record("r-1"))));
        assert_eq!(outcome.unwrap().unwrap().id, "r-1");
    }

    #[test]
    fn server_rejection_carries_its_reason() {
        let outcome = interpret(
            StatusCode::CONFLICT,
            envelope(false, Some("A report from this number is already pending"), None),
        );
        match outcome.unwrap_err() {
            ApiError::Rejected(reason) => {
                assert_eq!(reason, "A report from this number is already pending")
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn rejection_without_a_reason_gets_the_generic_text() {
        let outcome = interpret(StatusCode::BAD_REQUEST, envelope(false, None, None));
        match outcome.unwrap_err() {
            ApiError::Rejected(reason) => assert_eq!(reason, GENERIC_REJECTION),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn empty_reason_strings_count_as_missing() {
        let outcome = interpret(StatusCode::BAD_REQUEST, envelope(false, Some(""), None));
        match outcome.unwrap_err() {
            ApiError::Rejected(reason) => assert_eq!(reason, GENERIC_REJECTION),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn http_failure_overrides_an_ok_body() {
        let outcome = interpret(
            StatusCode::INTERNAL_SERVER_ERROR,
            envelope(true, None, Some(record("r-2"))),
        );
        assert!(matches!(outcome, Err(ApiError::Rejected(_))));
    }

    #[test]
    fn generic_rejection_text_reads_as_an_error_in_alerts() {
        let rejected = ApiError::Rejected(GENERIC_REJECTION.to_string());
        assert_eq!(Severity::infer(&rejected.to_string()), Severity::Error);
    }
}
