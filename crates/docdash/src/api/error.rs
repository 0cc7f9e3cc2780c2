//! Errors returned by the document service client.

use std::time::Duration;

use thiserror::Error;

/// Maximum length for error bodies carried in errors, to keep logs readable.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors that can occur while talking to the document service.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// The base URL cannot take a task path.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete within the fixed timeout.
    #[error("{endpoint} timed out after {}s", .timeout.as_secs())]
    Timeout { endpoint: String, timeout: Duration },

    /// Connection refused, reset, DNS failure and similar.
    #[error("{endpoint} request failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The service answered with a non-success status.
    #[error("{endpoint} returned {status}: {detail}")]
    Status {
        endpoint: String,
        status: u16,
        detail: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl ApiError {
    pub(crate) fn from_reqwest(endpoint: &str, err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ApiError::Timeout {
                endpoint: endpoint.to_string(),
                timeout,
            }
        } else if err.is_decode() {
            ApiError::Decode {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        } else {
            ApiError::Transport {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Builds a status error, preferring the service's `detail` field over the raw body.
    pub(crate) fn from_status(endpoint: &str, status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| match value.get("detail") {
                Some(serde_json::Value::String(detail)) => Some(detail.clone()),
                Some(other) => Some(other.to_string()),
                None => None,
            })
            .unwrap_or_else(|| truncate_body(body));

        ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            detail: truncate_body(&detail),
        }
    }

    /// Transient failures are retried only by the next scheduled poll.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            ApiError::Decode { .. } | ApiError::ClientBuild(_) | ApiError::InvalidUrl(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        let truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}... (truncated)", truncated)
    } else if body.is_empty() {
        "(empty response)".to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_prefers_detail_field() {
        let err = ApiError::from_status(
            "POST /api/upload",
            400,
            r#"{"detail": "Unsupported file extension: .docx"}"#,
        );
        match err {
            ApiError::Status { status, detail, .. } => {
                assert_eq!(status, 400);
                assert_eq!(detail, "Unsupported file extension: .docx");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_status_falls_back_to_body() {
        let err = ApiError::from_status("GET /api/results", 502, "Bad Gateway");
        assert_eq!(err.to_string(), "GET /api/results returned 502: Bad Gateway");
    }

    #[test]
    fn test_status_truncates_long_multibyte_body() {
        let body = "മലയാളം".repeat(100);
        let err = ApiError::from_status("GET /api/results", 500, &body);
        match err {
            ApiError::Status { detail, .. } => {
                assert!(detail.ends_with("... (truncated)"));
                assert_eq!(
                    detail.trim_end_matches("... (truncated)").chars().count(),
                    MAX_ERROR_BODY_CHARS
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_transient_classification() {
        let timeout = ApiError::Timeout {
            endpoint: "GET /api/results".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert!(timeout.is_transient());
        assert_eq!(timeout.to_string(), "GET /api/results timed out after 30s");

        let server = ApiError::from_status("GET /api/dashboard", 500, "");
        assert!(server.is_transient());
        assert_eq!(server.status(), Some(500));

        let decode = ApiError::Decode {
            endpoint: "GET /api/dashboard".to_string(),
            message: "missing field".to_string(),
        };
        assert!(!decode.is_transient());
        assert!(!ApiError::InvalidUrl("'..' is not a task id".to_string()).is_transient());
    }

    #[test]
    fn test_not_found() {
        assert!(ApiError::from_status("DELETE /api/results/t1", 404, "").is_not_found());
        assert!(!ApiError::from_status("DELETE /api/results/t1", 500, "").is_not_found());
    }
}
