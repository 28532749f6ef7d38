//! Object storage (v1) account, container and object views.
//!
//! Swift reports most state in response headers rather than bodies, so the
//! header-derived types here are built with `from_headers` over
//! `(name, value)` pairs. Header names are matched case-insensitively.

use std::collections::BTreeMap;

use serde::Deserialize;

pub const ACCOUNT_META_PREFIX: &str = "x-account-meta-";
pub const CONTAINER_META_PREFIX: &str = "x-container-meta-";
pub const OBJECT_META_PREFIX: &str = "x-object-meta-";

fn header<'a>(headers: &[(&'a str, &'a str)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
}

fn header_u64(headers: &[(&str, &str)], name: &str) -> u64 {
    header(headers, name)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default()
}

/// Custom metadata keyed by the lowercase suffix after `prefix`.
fn prefixed_metadata(headers: &[(&str, &str)], prefix: &str) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(key, value)| {
            let lower = key.to_ascii_lowercase();
            lower
                .strip_prefix(prefix)
                .map(|suffix| (suffix.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Result of `HEAD` on the account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub container_count: u64,
    pub object_count: u64,
    pub bytes_used: u64,
    pub metadata: BTreeMap<String, String>,
}

impl AccountInfo {
    #[must_use]
    pub fn from_headers(headers: &[(&str, &str)]) -> Self {
        Self {
            container_count: header_u64(headers, "x-account-container-count"),
            object_count: header_u64(headers, "x-account-object-count"),
            bytes_used: header_u64(headers, "x-account-bytes-used"),
            metadata: prefixed_metadata(headers, ACCOUNT_META_PREFIX),
        }
    }
}

/// Result of `HEAD` on a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerMetadata {
    pub object_count: u64,
    pub bytes_used: u64,
    pub read_acl: Option<String>,
    pub write_acl: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl ContainerMetadata {
    #[must_use]
    pub fn from_headers(headers: &[(&str, &str)]) -> Self {
        Self {
            object_count: header_u64(headers, "x-container-object-count"),
            bytes_used: header_u64(headers, "x-container-bytes-used"),
            read_acl: header(headers, "x-container-read").map(str::to_string),
            write_acl: header(headers, "x-container-write").map(str::to_string),
            metadata: prefixed_metadata(headers, CONTAINER_META_PREFIX),
        }
    }
}

/// Result of `HEAD`/`GET` on an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_length: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl ObjectMetadata {
    #[must_use]
    pub fn from_headers(headers: &[(&str, &str)]) -> Self {
        Self {
            content_length: header_u64(headers, "content-length"),
            content_type: header(headers, "content-type").map(str::to_string),
            etag: header(headers, "etag").map(|raw| raw.trim_matches('"').to_string()),
            last_modified: header(headers, "last-modified").map(str::to_string),
            metadata: prefixed_metadata(headers, OBJECT_META_PREFIX),
        }
    }
}

/// One entry of `GET /v1/{account}?format=json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerInfo {
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// One entry of `GET /v1/{account}/{container}?format=json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectInfo {
    pub name: String,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
}
