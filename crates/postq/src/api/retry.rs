//! Retry with exponential backoff for transient upstream failures.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use reqwest::{Response, StatusCode};

use crate::api::error::{ApiError, ErrorResponse};

/// Statuses treated as transient: rate limiting plus the common gateway
/// failures.
pub(crate) const RETRY_STATUSES: [StatusCode; 4] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Maximum retries after the initial attempt.
pub(crate) const MAX_RETRIES: u32 = 3;

const BASE_DELAY_MS: u64 = 1_000;
const MAX_DELAY_MS: u64 = 5_000;
const JITTER_MS: u64 = 200;

pub(crate) fn is_retryable(status: StatusCode) -> bool {
    RETRY_STATUSES.contains(&status)
}

/// Delay before retry `attempt` (zero-based): doubling per attempt, capped,
/// plus a bounded random component.
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    let exp = BASE_DELAY_MS
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(MAX_DELAY_MS);
    let jitter = rand::thread_rng().gen_range(0..=JITTER_MS);
    Duration::from_millis(exp + jitter)
}

/// Drives `send` until it yields a success response, a non-retryable
/// failure, or the retry budget is exhausted. Attempts are strictly
/// sequential; transport failures (no response at all) are folded into the
/// retryable set and surface as [`ApiError::Network`] after exhaustion.
pub(crate) async fn send_with_retry<F, Fut>(operation: &str, mut send: F) -> Result<Response, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        match send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                if !is_retryable(status) || attempt == MAX_RETRIES {
                    return Err(ApiError::Upstream(ErrorResponse::from_response(response).await));
                }
                log::warn!(
                    "{} returned {}, retrying ({}/{})",
                    operation,
                    status,
                    attempt + 1,
                    MAX_RETRIES
                );
            }
            Err(e) => {
                if attempt == MAX_RETRIES {
                    return Err(ApiError::Network(e));
                }
                log::warn!(
                    "{} failed without a response: {}, retrying ({}/{})",
                    operation,
                    e,
                    attempt + 1,
                    MAX_RETRIES
                );
            }
        }

        tokio::time::sleep(backoff_delay(attempt)).await;
        attempt += 1;
    }
}
