//! Thin HTTP clients for OpenStack-family service APIs.
//!
//! # Architecture
//!
//! - [`http_client`] builds the shared `reqwest::Client` from the `[http]`
//!   config section.
//! - [`RestClient`] owns one service's base URL, auth token and wire formats,
//!   and turns typed models into requests through `cloudcafe_types::marshal`.
//! - Each service module wraps a `RestClient` with one method per REST
//!   endpoint. No method polls or retries on resource state; that belongs
//!   to the behavior layer.
//!
//! Transient HTTP failures (429, 5xx, connection errors) are retried by
//! [`retry::send_with_retry`]; anything else surfaces as [`ClientError`].

pub mod bare_metal;
pub mod block_storage;
pub mod compute;
pub mod identity;
pub mod images;
pub mod networking;
pub mod object_storage;
mod rest;
pub mod retry;

use std::time::Duration;

use cloudcafe_config::HttpConfig;
use cloudcafe_types::MarshalError;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use thiserror::Error;

pub use bare_metal::BareMetalClient;
pub use block_storage::VolumesClient;
pub use compute::ComputeClient;
pub use identity::IdentityClient;
pub use images::ImagesClient;
pub use networking::NetworkingClient;
pub use object_storage::ObjectStorageClient;
pub use rest::{Payload, RestClient};

pub use cloudcafe_types;

const USER_AGENT: &str = concat!("cloudcafe-rs/", env!("CARGO_PKG_VERSION"));

// Note: reqwest only exposes tcp_keepalive (idle time); interval/retries use platform defaults.
const TCP_KEEPALIVE_SECS: u64 = 60;

const POOL_MAX_IDLE_PER_HOST: usize = 32;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Build the HTTP client every service client shares.
pub fn http_client(config: &HttpConfig) -> Result<reqwest::Client, ClientError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(config.connect_timeout())
        .timeout(config.timeout())
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)));

    if !config.verify_ssl {
        tracing::warn!("TLS certificate verification is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build().map_err(ClientError::Request)
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP {status}: {body}")]
    Http {
        status: StatusCode,
        body: String,
        request_id: Option<String>,
    },
    #[error("request failed after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Marshal(#[from] MarshalError),
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("response is missing the {0} header")]
    MissingHeader(&'static str),
}

impl ClientError {
    /// HTTP status of an error response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// A parsed 2xx response.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub entity: T,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Request id assigned by the service, if it echoed one.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        ["x-openstack-request-id", "x-compute-request-id", "x-trans-id"]
            .into_iter()
            .find_map(|name| self.header(name))
    }

    /// Headers as `(name, value)` pairs; non-UTF-8 values are skipped.
    #[must_use]
    pub fn header_pairs(&self) -> Vec<(&str, &str)> {
        self.headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)))
            .collect()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            headers: self.headers,
            entity: f(self.entity),
        }
    }

    pub fn into_entity(self) -> T {
        self.entity
    }
}

/// Read an error body, truncated to keep log lines and error values bounded.
pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
