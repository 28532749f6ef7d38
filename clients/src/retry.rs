//! HTTP retry policy with exponential backoff.
//!
//! # Retryable conditions
//!
//! - HTTP 429, any method
//! - HTTP 413 only when the service sent `Retry-After` (rate limiting by
//!   the compute API's absolute limits middleware), any method
//! - HTTP 408, 500, 502, 503, 504 and timeouts, idempotent methods only.
//!   OpenStack has no idempotency key, so a repeated POST can leave a
//!   second resource behind.
//! - Connection errors, where the request never reached the service
//!
//! # Headers
//!
//! - `X-OpenStack-Request-ID`: `req-{uuid}`, same across all attempts so a
//!   failed run can be traced through the service logs
//! - `X-Cafe-Retry-Count`: 0 for the initial attempt, 1+ for retries

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode, header::HeaderMap};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-OpenStack-Request-ID";
pub const RETRY_COUNT_HEADER: &str = "X-Cafe-Retry-Count";

/// Longest `Retry-After` the client will honor.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (not counting the initial request).
    pub max_retries: u32,
    /// Backoff before the first retry.
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Down-jitter factor (0.25 = up to 25% shorter).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_factor: 0.25,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn from_http(http: &cloudcafe_config::HttpConfig) -> Self {
        Self {
            max_retries: http.max_retries,
            initial_delay: Duration::from_millis(http.retry_initial_delay_ms),
            max_delay: Duration::from_millis(http.retry_max_delay_ms),
            ..Self::default()
        }
    }

    /// Single attempt, no backoff.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Parse `Retry-After` as whole seconds.
///
/// Returns `Some` only for `0 < delay < 60s`.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs = headers
        .get("retry-after")?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()?;
    let delay = Duration::from_secs(secs);
    (delay > Duration::ZERO && delay < MAX_RETRY_AFTER).then_some(delay)
}

#[must_use]
pub fn should_retry(method: &Method, status: StatusCode, headers: &HeaderMap) -> bool {
    match status.as_u16() {
        429 => true,
        413 => headers.contains_key("retry-after"),
        408 | 500 | 502 | 503 | 504 => method.is_idempotent(),
        _ => false,
    }
}

/// Delay before retry number `backoff_step + 1`.
///
/// A valid `Retry-After` wins; otherwise `initial_delay * 2^step`, capped at
/// `max_delay`, then down-jittered.
#[must_use]
pub fn calculate_retry_delay(
    backoff_step: u32,
    config: &RetryConfig,
    headers: Option<&HeaderMap>,
) -> Duration {
    if let Some(headers) = headers
        && let Some(delay) = parse_retry_after(headers)
    {
        return delay;
    }

    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(backoff_step as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter = 1.0 - rand::random::<f64>() * config.jitter_factor;
    Duration::from_secs_f64(capped * jitter)
}

pub fn add_retry_headers(
    builder: RequestBuilder,
    retry_count: u32,
    request_id: &str,
) -> RequestBuilder {
    builder
        .header(RETRY_COUNT_HEADER, retry_count.to_string())
        .header(REQUEST_ID_HEADER, request_id)
}

#[must_use]
pub fn generate_request_id() -> String {
    format!("req-{}", Uuid::new_v4())
}

/// Result of [`send_with_retry`].
///
/// Success and failure are separate variants so an error response can
/// never be mistaken for a parsed entity.
#[derive(Debug)]
pub enum RetryOutcome {
    /// 2xx response.
    Success(Response),
    /// Non-2xx response, either not retryable or after exhausting retries.
    HttpError(Response),
    /// Transport failure after exhausting retries.
    ConnectionError {
        attempts: u32,
        source: reqwest::Error,
    },
    /// Transport failure on the first attempt that cannot be retried.
    NonRetryable(reqwest::Error),
}

impl RetryOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Send a request built by `build_request`, retrying per `config`.
///
/// `build_request` is called once per attempt and must build a `method`
/// request. Every attempt carries the same `request_id`.
pub async fn send_with_retry<F>(
    method: &Method,
    build_request: F,
    request_id: &str,
    config: &RetryConfig,
) -> RetryOutcome
where
    F: Fn() -> RequestBuilder,
{
    for retry_count in 0..config.max_retries {
        let request = add_retry_headers(build_request(), retry_count, request_id);

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return RetryOutcome::Success(response);
                }

                if should_retry(method, status, response.headers()) {
                    let delay =
                        calculate_retry_delay(retry_count, config, Some(response.headers()));
                    tracing::warn!(
                        status = %status,
                        request_id,
                        retry_count = retry_count + 1,
                        delay_ms = delay.as_millis(),
                        "Retrying request after error status"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }

                return RetryOutcome::HttpError(response);
            }
            Err(e) => {
                if is_retryable_error(method, &e) {
                    let delay = calculate_retry_delay(retry_count, config, None);
                    tracing::warn!(
                        error = %e,
                        request_id,
                        retry_count = retry_count + 1,
                        delay_ms = delay.as_millis(),
                        "Retrying request after connection error"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }

                if retry_count == 0 {
                    return RetryOutcome::NonRetryable(e);
                }
                return RetryOutcome::ConnectionError {
                    attempts: retry_count + 1,
                    source: e,
                };
            }
        }
    }

    // Final attempt: no more retries possible.
    let request = add_retry_headers(build_request(), config.max_retries, request_id);

    match request.send().await {
        Ok(response) if response.status().is_success() => RetryOutcome::Success(response),
        Ok(response) => RetryOutcome::HttpError(response),
        Err(e) if config.max_retries == 0 => RetryOutcome::NonRetryable(e),
        Err(e) => RetryOutcome::ConnectionError {
            attempts: config.max_retries + 1,
            source: e,
        },
    }
}

fn is_retryable_error(method: &Method, error: &reqwest::Error) -> bool {
    error.is_connect() || (error.is_timeout() && method.is_idempotent())
}
