use std::time::Instant;

use cloudcafe_types::marshal::{self, Collection, Envelope, Format};
use cloudcafe_types::Secret;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::retry::{self, RetryConfig, RetryOutcome};
use crate::{ApiResponse, ClientError, read_capped_error_body};

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// A request body with its content type.
#[derive(Debug, Clone)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl Payload {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn json(value: &Value) -> Result<Self, ClientError> {
        let bytes = serde_json::to_vec(value).map_err(cloudcafe_types::MarshalError::from)?;
        Ok(Self::new(bytes, Format::Json.content_type()))
    }
}

/// Generic REST transport for one service endpoint.
///
/// Requests carry `X-Auth-Token` when a token is set, `Accept` for the
/// deserialize format and `Content-Type` for bodies. Each transaction logs
/// one debug line; the token never appears in logs.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<Secret>,
    serialize_format: Format,
    deserialize_format: Format,
    headers: HeaderMap,
    retry: RetryConfig,
}

impl RestClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|err| ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }
        Ok(Self {
            http,
            base_url,
            token: None,
            serialize_format: Format::Json,
            deserialize_format: Format::Json,
            headers: HeaderMap::new(),
            retry: RetryConfig::default(),
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: Secret) -> Self {
        self.token = Some(token);
        self
    }

    #[must_use]
    pub fn with_formats(mut self, serialize: Format, deserialize: Format) -> Self {
        self.serialize_format = serialize;
        self.deserialize_format = deserialize;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ClientError> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|err| ClientError::InvalidHeader {
                name: name.to_string(),
                reason: err.to_string(),
            })?;
        let value = HeaderValue::from_str(value).map_err(|err| ClientError::InvalidHeader {
            name: name.to_string(),
            reason: err.to_string(),
        })?;
        self.headers.insert(header_name, value);
        Ok(self)
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn serialize_format(&self) -> Format {
        self.serialize_format
    }

    #[must_use]
    pub fn deserialize_format(&self) -> Format {
        self.deserialize_format
    }

    /// Base URL extended by percent-encoded path `segments` and `query`.
    pub fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|()| ClientError::InvalidUrl {
                    url: self.base_url.to_string(),
                    reason: "URL cannot be used as a base".to_string(),
                })?
                .pop_if_empty()
                .extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// `GET` a single resource.
    pub async fn get<T>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<T>, ClientError>
    where
        T: Envelope + DeserializeOwned,
    {
        let url = self.url(segments, query)?;
        let response = self.send(Method::GET, url, None, &[]).await?;
        self.parse(response, |format, body| marshal::deserialize(format, body))
            .await
    }

    /// `GET` a resource listing.
    pub async fn list<T>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<T>>, ClientError>
    where
        T: Collection + DeserializeOwned,
    {
        let url = self.url(segments, query)?;
        let response = self.send(Method::GET, url, None, &[]).await?;
        self.parse(response, |format, body| marshal::deserialize_list(format, body))
            .await
    }

    /// `GET` a bare JSON document with no envelope.
    pub async fn get_json<T>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<T>, ClientError>
    where
        T: DeserializeOwned,
    {
        let url = self.url(segments, query)?;
        let response = self.send(Method::GET, url, None, &[]).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        let entity = serde_json::from_str(&body).map_err(cloudcafe_types::MarshalError::from)?;
        Ok(ApiResponse {
            status,
            headers,
            entity,
        })
    }

    /// `POST` a new resource.
    pub async fn create<B, T>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<ApiResponse<T>, ClientError>
    where
        B: Envelope + Serialize,
        T: Envelope + DeserializeOwned,
    {
        self.send_entity(Method::POST, segments, body).await
    }

    /// `PUT` an update.
    pub async fn update<B, T>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<ApiResponse<T>, ClientError>
    where
        B: Envelope + Serialize,
        T: Envelope + DeserializeOwned,
    {
        self.send_entity(Method::PUT, segments, body).await
    }

    /// `PATCH` with a caller-chosen content type; the body is JSON.
    pub async fn patch<B, T>(
        &self,
        segments: &[&str],
        body: &B,
        content_type: &str,
    ) -> Result<ApiResponse<T>, ClientError>
    where
        B: Serialize,
        T: Envelope + DeserializeOwned,
    {
        let url = self.url(segments, &[])?;
        let bytes = serde_json::to_vec(body).map_err(cloudcafe_types::MarshalError::from)?;
        let payload = Payload::new(bytes, content_type);
        let response = self.send(Method::PATCH, url, Some(payload), &[]).await?;
        self.parse(response, |format, body| marshal::deserialize(format, body))
            .await
    }

    pub async fn delete(&self, segments: &[&str]) -> Result<ApiResponse<()>, ClientError> {
        let url = self.url(segments, &[])?;
        let response = self.send(Method::DELETE, url, None, &[]).await?;
        Ok(empty(response))
    }

    /// `HEAD`; the interesting data is in the returned headers.
    pub async fn head(&self, segments: &[&str]) -> Result<ApiResponse<()>, ClientError> {
        let url = self.url(segments, &[])?;
        let response = self.send(Method::HEAD, url, None, &[]).await?;
        Ok(empty(response))
    }

    /// `POST` a JSON action body and ignore any response body.
    pub async fn action(
        &self,
        segments: &[&str],
        body: &Value,
    ) -> Result<ApiResponse<()>, ClientError> {
        self.send_json(Method::POST, segments, body).await
    }

    /// Send a JSON body with `method` and ignore any response body.
    pub async fn send_json(
        &self,
        method: Method,
        segments: &[&str],
        body: &Value,
    ) -> Result<ApiResponse<()>, ClientError> {
        let url = self.url(segments, &[])?;
        let response = self.send(method, url, Some(Payload::json(body)?), &[]).await?;
        Ok(empty(response))
    }

    /// `PUT` raw bytes with extra headers.
    pub async fn put_bytes(
        &self,
        segments: &[&str],
        payload: Payload,
        headers: &[(&str, &str)],
    ) -> Result<ApiResponse<()>, ClientError> {
        let url = self.url(segments, &[])?;
        let response = self.send(Method::PUT, url, Some(payload), headers).await?;
        Ok(empty(response))
    }

    /// `POST` with only headers, as used for metadata updates.
    pub async fn post_headers(
        &self,
        segments: &[&str],
        headers: &[(&str, &str)],
    ) -> Result<ApiResponse<()>, ClientError> {
        let url = self.url(segments, &[])?;
        let response = self.send(Method::POST, url, None, headers).await?;
        Ok(empty(response))
    }

    /// `GET` raw bytes.
    pub async fn get_bytes(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<u8>>, ClientError> {
        let url = self.url(segments, query)?;
        let response = self.send(Method::GET, url, None, &[]).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let entity = response.bytes().await?.to_vec();
        Ok(ApiResponse {
            status,
            headers,
            entity,
        })
    }

    async fn send_entity<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<ApiResponse<T>, ClientError>
    where
        B: Envelope + Serialize,
        T: Envelope + DeserializeOwned,
    {
        let url = self.url(segments, &[])?;
        let serialized = marshal::serialize(self.serialize_format, body)?;
        let payload = Payload::new(serialized, self.serialize_format.content_type());
        let response = self.send(method, url, Some(payload), &[]).await?;
        self.parse(response, |format, body| marshal::deserialize(format, body))
            .await
    }

    async fn parse<T, F>(
        &self,
        response: Response,
        decode: F,
    ) -> Result<ApiResponse<T>, ClientError>
    where
        F: FnOnce(Format, &str) -> Result<T, cloudcafe_types::MarshalError>,
    {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        let entity = decode(self.deserialize_format, &body)?;
        Ok(ApiResponse {
            status,
            headers,
            entity,
        })
    }

    /// Send one request through the retry policy.
    ///
    /// Returns the 2xx response or the mapped error.
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        payload: Option<Payload>,
        headers: &[(&str, &str)],
    ) -> Result<Response, ClientError> {
        let request_id = retry::generate_request_id();
        let started = Instant::now();

        let build = || {
            let mut builder = self
                .http
                .request(method.clone(), url.clone())
                .headers(self.headers.clone())
                .header(ACCEPT, self.deserialize_format.content_type());
            if let Some(token) = &self.token {
                builder = builder.header(AUTH_TOKEN_HEADER, token.expose_secret());
            }
            for (name, value) in headers {
                builder = builder.header(*name, *value);
            }
            if let Some(payload) = &payload {
                builder = builder
                    .header(CONTENT_TYPE, payload.content_type.as_str())
                    .body(payload.bytes.clone());
            }
            builder
        };

        let outcome = retry::send_with_retry(&method, build, &request_id, &self.retry).await;
        let elapsed_ms = started.elapsed().as_millis();

        match outcome {
            RetryOutcome::Success(response) => {
                tracing::debug!(
                    method = %method,
                    url = %url,
                    status = response.status().as_u16(),
                    elapsed_ms,
                    request_id = %request_id,
                    "HTTP transaction"
                );
                Ok(response)
            }
            RetryOutcome::HttpError(response) => {
                let status = response.status();
                let service_id = response
                    .headers()
                    .get("x-openstack-request-id")
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                tracing::debug!(
                    method = %method,
                    url = %url,
                    status = status.as_u16(),
                    elapsed_ms,
                    request_id = %request_id,
                    "HTTP transaction failed"
                );
                let body = read_capped_error_body(response).await;
                Err(ClientError::Http {
                    status,
                    body,
                    request_id: Some(service_id.unwrap_or(request_id)),
                })
            }
            RetryOutcome::ConnectionError { attempts, source } => {
                tracing::debug!(
                    method = %method,
                    url = %url,
                    attempts,
                    error = %source,
                    "HTTP transport failure"
                );
                Err(ClientError::Transport { attempts, source })
            }
            RetryOutcome::NonRetryable(source) => {
                tracing::debug!(
                    method = %method,
                    url = %url,
                    error = %source,
                    "HTTP request failure"
                );
                Err(ClientError::Request(source))
            }
        }
    }
}

fn empty(response: Response) -> ApiResponse<()> {
    ApiResponse {
        status: response.status(),
        headers: response.headers().clone(),
        entity: (),
    }
}
