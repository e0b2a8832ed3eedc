//! Normalized API error types.

use reqwest::{Response, StatusCode};
use thiserror::Error;

/// Response header carrying the upstream request-correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Uniform error shape produced from any failing HTTP response, regardless
/// of the upstream's actual error body format.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    /// Human-readable message extracted from the body.
    pub message: String,
    pub status: StatusCode,
    /// Correlation id from the `x-request-id` header, when present.
    pub request_id: Option<String>,
    /// Raw body for diagnostics.
    pub body: Option<String>,
}

impl ErrorResponse {
    /// Normalizes a failing response, consuming its body.
    ///
    /// Message priority: JSON `error.message`, JSON `error` string, JSON
    /// `message`, bare JSON string body, raw text body, HTTP status phrase.
    /// A body that cannot be read at all degrades to a generic message.
    pub async fn from_response(response: Response) -> Self {
        let status = response.status();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let fallback = status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();

        match response.bytes().await {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes).to_string();
                let message = extract_message(&bytes).unwrap_or_else(|| {
                    if text.is_empty() {
                        fallback
                    } else {
                        text.clone()
                    }
                });
                Self {
                    message,
                    status,
                    request_id,
                    body: (!text.is_empty()).then_some(text),
                }
            }
            Err(e) => Self {
                message: format!("Failed to read response body: {}", e),
                status,
                request_id,
                body: None,
            },
        }
    }
}

/// Extracts a human-readable message from a JSON error envelope. Returns
/// `None` when the body is not JSON or carries no recognizable message.
fn extract_message(bytes: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    if let serde_json::Value::String(s) = &value {
        return Some(s.clone());
    }
    if let Some(error) = value.get("error") {
        if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
            return Some(message.to_string());
        }
        if let Some(message) = error.as_str() {
            return Some(message.to_string());
        }
    }
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

/// Errors surfaced by the API client. Every rejected call produces one of
/// these; nothing is silently swallowed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The upstream returned a non-success response (after retries, when the
    /// status was retryable).
    #[error("{} (status {})", .0.message, .0.status.as_u16())]
    Upstream(ErrorResponse),

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote reported success but returned an empty result.
    #[error("remote returned an empty result")]
    EmptyResult,

    /// A success response could not be decoded for its endpoint.
    #[error("invalid response payload: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// The HTTP status of the failing response, when one arrived.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Upstream(response) => Some(response.status),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(builder: http::response::Builder, body: &'static str) -> Response {
        Response::from(builder.body(body).unwrap())
    }

    #[tokio::test]
    async fn test_extracts_message_from_error_envelope() {
        let raw = response(
            http::Response::builder()
                .status(400)
                .header("content-type", "application/json")
                .header(REQUEST_ID_HEADER, "abc-123"),
            r#"{"error":{"message":"Invalid payload"}}"#,
        );

        let normalized = ErrorResponse::from_response(raw).await;
        assert_eq!(normalized.message, "Invalid payload");
        assert_eq!(normalized.status, StatusCode::BAD_REQUEST);
        assert_eq!(normalized.request_id.as_deref(), Some("abc-123"));
    }

    #[tokio::test]
    async fn test_extracts_top_level_error_string() {
        let raw = response(
            http::Response::builder().status(422),
            r#"{"error":"tags must not be empty"}"#,
        );

        let normalized = ErrorResponse::from_response(raw).await;
        assert_eq!(normalized.message, "tags must not be empty");
    }

    #[tokio::test]
    async fn test_extracts_top_level_message() {
        let raw = response(
            http::Response::builder().status(403),
            r#"{"message":"forbidden"}"#,
        );

        let normalized = ErrorResponse::from_response(raw).await;
        assert_eq!(normalized.message, "forbidden");
    }

    #[tokio::test]
    async fn test_bare_json_string_body() {
        let raw = response(http::Response::builder().status(400), r#""bad request""#);

        let normalized = ErrorResponse::from_response(raw).await;
        assert_eq!(normalized.message, "bad request");
    }

    #[tokio::test]
    async fn test_falls_back_to_text_body() {
        let raw = response(
            http::Response::builder()
                .status(500)
                .header("content-type", "text/plain"),
            "Something went wrong",
        );

        let normalized = ErrorResponse::from_response(raw).await;
        assert!(normalized.message.contains("Something went wrong"));
        assert_eq!(normalized.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(normalized.request_id.is_none());
    }

    #[tokio::test]
    async fn test_json_without_message_falls_back_to_raw_text() {
        let raw = response(
            http::Response::builder()
                .status(500)
                .header("content-type", "application/json"),
            r#"{"code":17}"#,
        );

        let normalized = ErrorResponse::from_response(raw).await;
        assert_eq!(normalized.message, r#"{"code":17}"#);
        assert_eq!(normalized.body.as_deref(), Some(r#"{"code":17}"#));
    }

    #[tokio::test]
    async fn test_empty_body_falls_back_to_status_phrase() {
        let raw = response(http::Response::builder().status(503), "");

        let normalized = ErrorResponse::from_response(raw).await;
        assert_eq!(normalized.message, "Service Unavailable");
        assert!(normalized.body.is_none());
    }
}
