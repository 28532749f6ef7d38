//! Object storage (v1) API client.
//!
//! The base URL is the account storage URL (`.../v1/AUTH_{tenant}`), taken
//! from the catalog or from a TempAuth exchange. Listings are requested as
//! JSON with `format=json`; an empty account or container answers 204.

use std::collections::BTreeMap;

use cloudcafe_types::Format;
use cloudcafe_types::object_storage::{
    AccountInfo, ContainerInfo, ContainerMetadata, ObjectInfo, ObjectMetadata,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::{ApiResponse, ClientError, Payload, RestClient};

const FORMAT_JSON: (&str, &str) = ("format", "json");
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct ObjectStorageClient {
    rest: RestClient,
}

impl ObjectStorageClient {
    #[must_use]
    pub fn new(rest: RestClient) -> Self {
        Self {
            rest: rest.with_formats(Format::Json, Format::Json),
        }
    }

    #[must_use]
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub async fn head_account(&self) -> Result<ApiResponse<AccountInfo>, ClientError> {
        let response = self.rest.head(&[]).await?;
        let info = AccountInfo::from_headers(&response.header_pairs());
        Ok(response.map(|()| info))
    }

    pub async fn list_containers(
        &self,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<ContainerInfo>>, ClientError> {
        self.listing(&[], query).await
    }

    /// `PUT` a container, optionally with `X-Container-Meta-*` headers.
    pub async fn create_container(
        &self,
        container: &str,
        metadata: &BTreeMap<String, String>,
    ) -> Result<ApiResponse<()>, ClientError> {
        let headers = meta_headers("X-Container-Meta-", metadata);
        self.rest
            .put_bytes(
                &[container],
                Payload::new(Vec::new(), DEFAULT_CONTENT_TYPE),
                &as_pairs(&headers),
            )
            .await
    }

    pub async fn head_container(
        &self,
        container: &str,
    ) -> Result<ApiResponse<ContainerMetadata>, ClientError> {
        let response = self.rest.head(&[container]).await?;
        let metadata = ContainerMetadata::from_headers(&response.header_pairs());
        Ok(response.map(|()| metadata))
    }

    pub async fn set_container_metadata(
        &self,
        container: &str,
        metadata: &BTreeMap<String, String>,
    ) -> Result<ApiResponse<()>, ClientError> {
        let headers = meta_headers("X-Container-Meta-", metadata);
        self.rest
            .post_headers(&[container], &as_pairs(&headers))
            .await
    }

    /// Fails with 409 while the container still holds objects.
    pub async fn delete_container(&self, container: &str) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&[container]).await
    }

    /// List objects; `query` carries `prefix`, `delimiter`, `marker` or
    /// `limit`.
    pub async fn list_objects(
        &self,
        container: &str,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<ObjectInfo>>, ClientError> {
        self.listing(&[container], query).await
    }

    pub async fn put_object(
        &self,
        container: &str,
        name: &str,
        data: impl Into<Vec<u8>>,
        content_type: Option<&str>,
        metadata: &BTreeMap<String, String>,
    ) -> Result<ApiResponse<()>, ClientError> {
        let headers = meta_headers("X-Object-Meta-", metadata);
        let payload = Payload::new(data, content_type.unwrap_or(DEFAULT_CONTENT_TYPE));
        self.rest
            .put_bytes(&[container, name], payload, &as_pairs(&headers))
            .await
    }

    pub async fn get_object(
        &self,
        container: &str,
        name: &str,
    ) -> Result<ApiResponse<Vec<u8>>, ClientError> {
        self.rest.get_bytes(&[container, name], &[]).await
    }

    pub async fn head_object(
        &self,
        container: &str,
        name: &str,
    ) -> Result<ApiResponse<ObjectMetadata>, ClientError> {
        let response = self.rest.head(&[container, name]).await?;
        let metadata = ObjectMetadata::from_headers(&response.header_pairs());
        Ok(response.map(|()| metadata))
    }

    /// Replace the object's custom metadata.
    pub async fn set_object_metadata(
        &self,
        container: &str,
        name: &str,
        metadata: &BTreeMap<String, String>,
    ) -> Result<ApiResponse<()>, ClientError> {
        let headers = meta_headers("X-Object-Meta-", metadata);
        self.rest
            .post_headers(&[container, name], &as_pairs(&headers))
            .await
    }

    pub async fn delete_object(
        &self,
        container: &str,
        name: &str,
    ) -> Result<ApiResponse<()>, ClientError> {
        self.rest.delete(&[container, name]).await
    }

    async fn listing<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<ApiResponse<Vec<T>>, ClientError> {
        let mut full_query = Vec::with_capacity(query.len() + 1);
        full_query.push(FORMAT_JSON);
        full_query.extend(query.iter().filter(|(key, _)| *key != "format").copied());

        let response = self.rest.get_bytes(segments, &full_query).await?;
        if response.status == StatusCode::NO_CONTENT || response.entity.is_empty() {
            return Ok(response.map(|_| Vec::new()));
        }
        let entries: Vec<T> = serde_json::from_slice(&response.entity)
            .map_err(cloudcafe_types::MarshalError::from)?;
        Ok(response.map(|_| entries))
    }
}

fn meta_headers(prefix: &str, metadata: &BTreeMap<String, String>) -> Vec<(String, String)> {
    metadata
        .iter()
        .map(|(key, value)| (format!("{prefix}{key}"), value.clone()))
        .collect()
}

fn as_pairs(headers: &[(String, String)]) -> Vec<(&str, &str)> {
    headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect()
}
