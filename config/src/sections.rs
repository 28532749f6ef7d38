//! Typed views over the config file's sections.
//!
//! Every struct here deserializes one TOML table. Fields carry serde
//! defaults so a partially filled section still loads; only
//! `[user_auth_config]` is mandatory.

use std::collections::BTreeMap;
use std::time::Duration;

use cloudcafe_types::Format;
use cloudcafe_types::Secret;
use cloudcafe_types::identity::EndpointInterface;
use serde::{Deserialize, Deserializer};

/// A config section with a fixed table name.
pub trait Section: serde::de::DeserializeOwned + Default {
    const NAME: &'static str;
}

/// How the identity exchange is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStrategy {
    /// Keystone v2.0 password credentials.
    #[default]
    Keystone,
    /// Keystone v2.0 with the `RAX-KSKEY` API-key extension.
    RaxAuth,
    /// Swift all-in-one TempAuth (`/auth/v1.0`).
    SaioTempauth,
}

impl AuthStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keystone => "keystone",
            Self::RaxAuth => "rax_auth",
            Self::SaioTempauth => "saio_tempauth",
        }
    }
}

/// `[user_auth_config]`
#[derive(Debug, Clone, Deserialize)]
pub struct UserAuthConfig {
    #[serde(deserialize_with = "lenient_string")]
    pub endpoint: String,
    #[serde(default)]
    pub strategy: AuthStrategy,
    #[serde(default)]
    pub serialize_format: Format,
    #[serde(default)]
    pub deserialize_format: Format,
}

/// `[user]`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserConfig {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_secret")]
    pub password: Option<Secret>,
    #[serde(default, deserialize_with = "lenient_opt_secret")]
    pub api_key: Option<Secret>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub tenant_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub tenant_name: Option<String>,
}

impl Section for UserConfig {
    const NAME: &'static str = "user";
}

/// `[http]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub max_retries: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub verify_ssl: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_initial_delay_ms: 500,
            retry_max_delay_ms: 8_000,
            timeout_seconds: 60,
            connect_timeout_seconds: 10,
            verify_ssl: true,
        }
    }
}

impl Section for HttpConfig {
    const NAME: &'static str = "http";
}

impl HttpConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// The services this library talks to, with their config table names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Compute,
    BlockStorage,
    Networking,
    Images,
    BareMetal,
    ObjectStorage,
}

impl Service {
    pub const ALL: [Self; 6] = [
        Self::Compute,
        Self::BlockStorage,
        Self::Networking,
        Self::Images,
        Self::BareMetal,
        Self::ObjectStorage,
    ];

    /// Name of the behavior section (`[blockstorage]`).
    #[must_use]
    pub const fn section(self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::BlockStorage => "blockstorage",
            Self::Networking => "networking",
            Self::Images => "images",
            Self::BareMetal => "baremetal",
            Self::ObjectStorage => "objectstorage",
        }
    }

    /// Name of the endpoint section (`[blockstorage_endpoint]`).
    #[must_use]
    pub const fn endpoint_section(self) -> &'static str {
        match self {
            Self::Compute => "compute_endpoint",
            Self::BlockStorage => "blockstorage_endpoint",
            Self::Networking => "networking_endpoint",
            Self::Images => "images_endpoint",
            Self::BareMetal => "baremetal_endpoint",
            Self::ObjectStorage => "objectstorage_endpoint",
        }
    }

    /// Catalog name used when the endpoint section does not name one.
    #[must_use]
    pub const fn default_catalog_name(self) -> &'static str {
        match self {
            Self::Compute => "nova",
            Self::BlockStorage => "cinderv2",
            Self::Networking => "neutron",
            Self::Images => "glance",
            Self::BareMetal => "ironic",
            Self::ObjectStorage => "swift",
        }
    }
}

/// `[<service>_endpoint]`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointConfig {
    #[serde(default, deserialize_with = "lenient_string")]
    pub service_name: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub region: Option<String>,
    #[serde(default)]
    pub interface: EndpointInterface,
    /// Skip the catalog and use this URL as-is.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub endpoint_override: Option<String>,
}

/// `[compute]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComputeConfig {
    #[serde(deserialize_with = "lenient_opt_string")]
    pub image_ref: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub image_ref_alt: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub flavor_ref: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub flavor_ref_alt: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub network_id: Option<String>,
    pub server_build_timeout: u64,
    pub server_delete_timeout: u64,
    pub server_status_interval: u64,
    /// Delete a server that failed to reach `ACTIVE`.
    pub cleanup_on_failure: bool,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            image_ref: None,
            image_ref_alt: None,
            flavor_ref: None,
            flavor_ref_alt: None,
            network_id: None,
            server_build_timeout: 600,
            server_delete_timeout: 300,
            server_status_interval: 15,
            cleanup_on_failure: true,
        }
    }
}

impl Section for ComputeConfig {
    const NAME: &'static str = "compute";
}

/// `[blockstorage]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlockStorageConfig {
    pub min_volume_size: u64,
    pub max_volume_size: u64,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub default_volume_type: Option<String>,
    pub volume_create_min_timeout: u64,
    pub volume_create_max_timeout: u64,
    pub volume_create_wait_per_gigabyte: u64,
    pub volume_delete_min_timeout: u64,
    pub volume_delete_max_timeout: u64,
    pub volume_delete_wait_per_gigabyte: u64,
    pub snapshot_create_timeout: u64,
    pub snapshot_delete_timeout: u64,
    pub volume_status_poll_frequency: u64,
    /// Delete a volume that failed to become available.
    pub cleanup_on_failure: bool,
}

impl Default for BlockStorageConfig {
    fn default() -> Self {
        Self {
            min_volume_size: 1,
            max_volume_size: 1024,
            default_volume_type: None,
            volume_create_min_timeout: 1,
            volume_create_max_timeout: 600,
            volume_create_wait_per_gigabyte: 1,
            volume_delete_min_timeout: 1,
            volume_delete_max_timeout: 600,
            volume_delete_wait_per_gigabyte: 1,
            snapshot_create_timeout: 600,
            snapshot_delete_timeout: 600,
            volume_status_poll_frequency: 1,
            cleanup_on_failure: true,
        }
    }
}

impl Section for BlockStorageConfig {
    const NAME: &'static str = "blockstorage";
}

/// `[networking]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkingConfig {
    pub resource_build_attempts: u32,
    pub status_timeout: u64,
    pub status_poll_interval: u64,
    pub delete_timeout: u64,
}

impl Default for NetworkingConfig {
    fn default() -> Self {
        Self {
            resource_build_attempts: 1,
            status_timeout: 120,
            status_poll_interval: 2,
            delete_timeout: 60,
        }
    }
}

impl Section for NetworkingConfig {
    const NAME: &'static str = "networking";
}

/// `[images]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    #[serde(deserialize_with = "lenient_opt_string")]
    pub import_from: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub import_from_format: String,
    #[serde(deserialize_with = "lenient_string")]
    pub container_format: String,
    #[serde(deserialize_with = "lenient_string")]
    pub disk_format: String,
    pub image_status_timeout: u64,
    pub task_status_timeout: u64,
    pub status_poll_interval: u64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            import_from: None,
            import_from_format: "qcow2".to_string(),
            container_format: "bare".to_string(),
            disk_format: "raw".to_string(),
            image_status_timeout: 600,
            task_status_timeout: 600,
            status_poll_interval: 5,
        }
    }
}

impl Section for ImagesConfig {
    const NAME: &'static str = "images";
}

/// `[baremetal]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BareMetalConfig {
    /// Sent as `X-OpenStack-Ironic-API-Version` when set.
    #[serde(deserialize_with = "lenient_opt_string")]
    pub api_version: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub default_driver: String,
    pub provision_timeout: u64,
    pub power_timeout: u64,
    pub status_poll_interval: u64,
}

impl Default for BareMetalConfig {
    fn default() -> Self {
        Self {
            api_version: None,
            default_driver: "fake-hardware".to_string(),
            provision_timeout: 1800,
            power_timeout: 300,
            status_poll_interval: 5,
        }
    }
}

impl Section for BareMetalConfig {
    const NAME: &'static str = "baremetal";
}

/// `[objectstorage]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObjectStorageConfig {
    pub listing_timeout: u64,
    pub listing_poll_interval: u64,
    #[serde(deserialize_with = "lenient_string")]
    pub default_content_type: String,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            listing_timeout: 30,
            listing_poll_interval: 1,
            default_content_type: "application/octet-stream".to_string(),
        }
    }
}

impl Section for ObjectStorageConfig {
    const NAME: &'static str = "objectstorage";
}

/// Field filters for one resource kind: `field -> allowed values`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    #[serde(deserialize_with = "filter_map")]
    pub include: BTreeMap<String, Vec<String>>,
    #[serde(deserialize_with = "filter_map")]
    pub exclude: BTreeMap<String, Vec<String>>,
}

impl FilterConfig {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// `[datasets]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatasetsConfig {
    /// Compute (Nova) image listings: `ACTIVE`, `SAVING`, ...
    pub images: FilterConfig,
    /// Image service (Glance) listings: `active`, `queued`, ...
    pub glance_images: FilterConfig,
    pub flavors: FilterConfig,
    pub volume_types: FilterConfig,
    pub drivers: FilterConfig,
    /// Keep at most this many datasets per generator.
    pub max_datasets: Option<usize>,
    pub randomize: bool,
}

impl Section for DatasetsConfig {
    const NAME: &'static str = "datasets";
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Str(value) => value,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Scalar),
    Many(Vec<Scalar>),
}

/// String fields accept any scalar, so `CAFE_compute_flavor_ref=1` still
/// loads as `"1"`.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(Scalar::into_string)
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
}

fn lenient_opt_secret<'de, D>(deserializer: D) -> Result<Option<Secret>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.map(Secret::from))
}

/// Filter values may be written as scalars or lists of any scalar type;
/// they are compared as strings.
fn filter_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, OneOrMany>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(field, values)| {
            let values = match values {
                OneOrMany::One(value) => vec![value.into_string()],
                OneOrMany::Many(values) => values.into_iter().map(Scalar::into_string).collect(),
            };
            (field, values)
        })
        .collect())
}
