//! Identity (v2.0) and Swift TempAuth client.

use cloudcafe_types::identity::{Access, AuthRequest, TempAuth, Tenant};
use cloudcafe_types::Secret;
use reqwest::Method;

use crate::{ApiResponse, ClientError, RestClient};

const VERSION: &str = "v2.0";
const AUTH_USER_HEADER: &str = "X-Auth-User";
const AUTH_KEY_HEADER: &str = "X-Auth-Key";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const STORAGE_URL_HEADER: &str = "X-Storage-Url";

/// Client for the configured auth endpoint.
///
/// The endpoint may be given with or without the trailing `v2.0`.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    rest: RestClient,
    versioned: bool,
}

impl IdentityClient {
    #[must_use]
    pub fn new(rest: RestClient) -> Self {
        let versioned = rest
            .base_url()
            .path_segments()
            .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
            == Some(VERSION);
        Self { rest, versioned }
    }

    #[must_use]
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    fn path<'a>(&self, tail: &[&'a str]) -> Vec<&'a str> {
        let mut segments = Vec::with_capacity(tail.len() + 1);
        if !self.versioned {
            segments.push(VERSION);
        }
        segments.extend_from_slice(tail);
        segments
    }

    /// `POST /v2.0/tokens`.
    pub async fn authenticate(
        &self,
        request: &AuthRequest,
    ) -> Result<ApiResponse<Access>, ClientError> {
        self.rest.create(&self.path(&["tokens"]), request).await
    }

    /// `GET /v2.0/tenants` with the client's token.
    pub async fn list_tenants(&self) -> Result<ApiResponse<Vec<Tenant>>, ClientError> {
        self.rest.list(&self.path(&["tenants"]), &[]).await
    }

    /// Swift TempAuth exchange: `GET /auth/v1.0` with user and key headers.
    pub async fn tempauth(
        &self,
        user: &str,
        key: &Secret,
    ) -> Result<ApiResponse<TempAuth>, ClientError> {
        let url = self.rest.url(&["auth", "v1.0"], &[])?;
        let response = self
            .rest
            .send(
                Method::GET,
                url,
                None,
                &[(AUTH_USER_HEADER, user), (AUTH_KEY_HEADER, key.expose_secret())],
            )
            .await?;
        let response = ApiResponse {
            status: response.status(),
            headers: response.headers().clone(),
            entity: (),
        };

        let token = response
            .header(AUTH_TOKEN_HEADER)
            .ok_or(ClientError::MissingHeader(AUTH_TOKEN_HEADER))?
            .to_string();
        let storage_url = response
            .header(STORAGE_URL_HEADER)
            .ok_or(ClientError::MissingHeader(STORAGE_URL_HEADER))?
            .to_string();
        Ok(response.map(|()| TempAuth {
            token: Secret::new(token),
            storage_url,
        }))
    }
}
