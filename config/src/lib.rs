//! Shared configuration for a CloudCAFE test run.
//!
//! One TOML file holds every section. Its location comes from
//! `CAFE_CONFIG_FILE_PATH`, falling back to `~/.cloudcafe/config.toml`.
//! String values may reference environment variables as `${NAME}`, and any
//! key can be overridden from the environment as `CAFE_<section>_<key>`.

mod sections;

use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::de::DeserializeOwned;
use thiserror::Error;

pub use sections::{
    AuthStrategy, BareMetalConfig, BlockStorageConfig, ComputeConfig, DatasetsConfig,
    EndpointConfig, FilterConfig, HttpConfig, ImagesConfig, NetworkingConfig,
    ObjectStorageConfig, Section, Service, UserAuthConfig, UserConfig,
};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "CAFE_CONFIG_FILE_PATH";
const OVERRIDE_PREFIX: &str = "CAFE_";
const USER_AUTH_SECTION: &str = "user_auth_config";
const INLINE_SOURCE: &str = "<inline>";

/// Sections an override may target even when the file does not declare them.
const KNOWN_SECTIONS: &[&str] = &[
    USER_AUTH_SECTION,
    "user",
    "http",
    "datasets",
    "compute",
    "compute_endpoint",
    "blockstorage",
    "blockstorage_endpoint",
    "networking",
    "networking_endpoint",
    "images",
    "images_endpoint",
    "baremetal",
    "baremetal_endpoint",
    "objectstorage",
    "objectstorage_endpoint",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config section [{section}] is missing")]
    MissingSection { section: String },
    #[error("config section [{section}] is invalid: {message}")]
    Invalid { section: String, message: String },
}

impl ConfigError {
    /// File the error refers to, for IO and parse failures.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound { path } | Self::Read { path, .. } | Self::Parse { path, .. } => {
                Some(path)
            }
            Self::MissingSection { .. } | Self::Invalid { .. } => None,
        }
    }

    /// Section the error refers to, for lookup and validation failures.
    #[must_use]
    pub fn section(&self) -> Option<&str> {
        match self {
            Self::MissingSection { section } | Self::Invalid { section, .. } => Some(section),
            Self::NotFound { .. } | Self::Read { .. } | Self::Parse { .. } => None,
        }
    }
}

/// Parsed config file with env expansion and overrides applied.
#[derive(Debug, Clone, Default)]
pub struct CafeConfig {
    path: Option<PathBuf>,
    table: toml::Table,
}

impl CafeConfig {
    /// Load the file named by `CAFE_CONFIG_FILE_PATH` or the default path.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path().ok_or_else(|| ConfigError::NotFound {
            path: PathBuf::from("~/.cloudcafe/config.toml"),
        })?;
        Self::load_from(path)
    }

    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read { path, source: err });
            }
        };

        let mut config = Self::parse(&content, &path, env::vars())?;
        config.path = Some(path);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Path::new(INLINE_SOURCE), env::vars())
    }

    /// Parse `content` taking overrides from `vars` instead of the process
    /// environment.
    pub fn from_toml_str_with_env<I>(content: &str, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::parse(content, Path::new(INLINE_SOURCE), vars)
    }

    fn parse<I>(content: &str, path: &Path, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut table: toml::Table = match toml::from_str(content) {
            Ok(table) => table,
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        for (_, value) in table.iter_mut() {
            expand_value(value);
        }
        apply_overrides(&mut table, vars);
        Ok(Self { path: None, table })
    }

    /// File this config was loaded from, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        self.table.get(name).is_some_and(toml::Value::is_table)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.table
            .iter()
            .filter(|(_, value)| value.is_table())
            .map(|(name, _)| name.as_str())
    }

    /// Deserialize the named section, or `T::default()` when it is absent.
    pub fn section<T>(&self, name: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default,
    {
        match self.table.get(name) {
            Some(value) => decode(name, value),
            None => Ok(T::default()),
        }
    }

    /// Deserialize the named section, failing when it is absent.
    pub fn require_section<T>(&self, name: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        let value = self
            .table
            .get(name)
            .ok_or_else(|| ConfigError::MissingSection {
                section: name.to_string(),
            })?;
        decode(name, value)
    }

    pub fn get<T: Section>(&self) -> Result<T, ConfigError> {
        self.section(T::NAME)
    }

    pub fn user_auth(&self) -> Result<UserAuthConfig, ConfigError> {
        self.require_section(USER_AUTH_SECTION)
    }

    /// Endpoint selection for `service`, with the catalog name defaulted.
    pub fn endpoint(&self, service: Service) -> Result<EndpointConfig, ConfigError> {
        let mut endpoint: EndpointConfig = self.section(service.endpoint_section())?;
        if endpoint.service_name.trim().is_empty() {
            endpoint.service_name = service.default_catalog_name().to_string();
        }
        Ok(endpoint)
    }

    /// Raw value of `section.key` after expansion and overrides.
    #[must_use]
    pub fn value(&self, section: &str, key: &str) -> Option<&toml::Value> {
        self.table.get(section)?.as_table()?.get(key)
    }
}

fn decode<T: DeserializeOwned>(name: &str, value: &toml::Value) -> Result<T, ConfigError> {
    if !value.is_table() {
        return Err(ConfigError::Invalid {
            section: name.to_string(),
            message: format!("expected a table, found {}", value.type_str()),
        });
    }
    value
        .clone()
        .try_into()
        .map_err(|err: toml::de::Error| ConfigError::Invalid {
            section: name.to_string(),
            message: err.to_string(),
        })
}

/// Path of the config file: `CAFE_CONFIG_FILE_PATH` or the home default.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    match env::var_os(CONFIG_PATH_ENV) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => dirs::home_dir().map(|home| home.join(".cloudcafe").join("config.toml")),
    }
}

/// Replace `${NAME}` with the value of environment variable `NAME`.
///
/// Unset variables expand to the empty string; an unclosed `${` is kept.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    expand_with(value, |name| env::var(name).ok())
}

fn expand_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        if !name.is_empty() {
            out.push_str(&lookup(name).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn expand_value(value: &mut toml::Value) {
    match value {
        toml::Value::String(raw) => {
            if raw.contains("${") {
                *raw = expand_env_vars(raw);
            }
        }
        toml::Value::Array(items) => items.iter_mut().for_each(expand_value),
        toml::Value::Table(table) => table.iter_mut().for_each(|(_, v)| expand_value(v)),
        toml::Value::Integer(_)
        | toml::Value::Float(_)
        | toml::Value::Boolean(_)
        | toml::Value::Datetime(_) => {}
    }
}

fn apply_overrides<I>(table: &mut toml::Table, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut sections: Vec<String> = KNOWN_SECTIONS.iter().map(ToString::to_string).collect();
    sections.extend(
        table
            .iter()
            .filter(|(_, value)| value.is_table())
            .map(|(name, _)| name.clone()),
    );
    // Longest first so `user_auth_config` wins over `user`.
    sections.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    sections.dedup();

    for (name, raw) in vars {
        if name == CONFIG_PATH_ENV {
            continue;
        }
        let Some(rest) = name.strip_prefix(OVERRIDE_PREFIX) else {
            continue;
        };
        let Some((section, key)) = sections.iter().find_map(|section| {
            rest.strip_prefix(section.as_str())
                .and_then(|tail| tail.strip_prefix('_'))
                .filter(|key| !key.is_empty())
                .map(|key| (section.as_str(), key))
        }) else {
            continue;
        };

        let entry = table
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        let Some(section_table) = entry.as_table_mut() else {
            tracing::warn!("Ignoring override {name}: [{section}] is not a table");
            continue;
        };
        let value = match section_table.get(key) {
            Some(toml::Value::String(_)) => toml::Value::String(raw),
            _ => coerce(&raw),
        };
        tracing::debug!("Config override applied to {section}.{key}");
        section_table.insert(key.to_string(), value);
    }
}

/// Bool, then integer, then float, then string.
fn coerce(raw: &str) -> toml::Value {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return toml::Value::Boolean(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return toml::Value::Boolean(false);
    }
    // Only when lossless: `007` and `1.10` stay strings.
    if let Ok(int) = trimmed.parse::<i64>()
        && int.to_string() == trimmed
    {
        return toml::Value::Integer(int);
    }
    if let Ok(float) = trimmed.parse::<f64>()
        && float.to_string() == trimmed
    {
        return toml::Value::Float(float);
    }
    toml::Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudcafe_types::Format;
    use cloudcafe_types::identity::EndpointInterface;

    const SAMPLE: &str = r#"
[user_auth_config]
endpoint = "http://keystone:5000"
strategy = "rax_auth"
serialize_format = "json"
deserialize_format = "xml"

[user]
username = "demo"
api_key = "abc123"
tenant_name = "demo"

[blockstorage]
min_volume_size = 2
volume_create_max_timeout = 900
default_volume_type = "lvm"

[blockstorage_endpoint]
region = "RegionOne"
interface = "internal"
"#;

    fn no_env() -> Vec<(String, String)> {
        Vec::new()
    }

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    // expansion

    #[test]
    fn expand_no_vars() {
        assert_eq!(expand_with("hello world", |_| None), "hello world");
    }

    #[test]
    fn expand_single_and_adjacent_vars() {
        let lookup = |name: &str| match name {
            "A" => Some("x".to_string()),
            "B" => Some("y".to_string()),
            _ => None,
        };
        assert_eq!(expand_with("pre ${A} post", lookup), "pre x post");
        assert_eq!(expand_with("${A}${B}", lookup), "xy");
    }

    #[test]
    fn expand_missing_var_becomes_empty() {
        assert_eq!(expand_with("a ${NOPE} b", |_| None), "a  b");
    }

    #[test]
    fn expand_unclosed_brace_preserved() {
        assert_eq!(expand_with("test ${UNCLOSED", |_| None), "test ${UNCLOSED");
    }

    #[test]
    fn expand_empty_name_dropped() {
        assert_eq!(expand_with("test ${} more", |_| None), "test  more");
    }

    #[test]
    fn expand_reads_process_env() {
        unsafe {
            std::env::set_var("CLOUDCAFE_TEST_EXPAND_VAR", "replaced");
        }
        let config = CafeConfig::from_toml_str_with_env(
            "[user]\npassword = \"${CLOUDCAFE_TEST_EXPAND_VAR}\"",
            no_env(),
        )
        .unwrap();
        let user: UserConfig = config.get().unwrap();
        assert_eq!(user.password.unwrap().expose_secret(), "replaced");
        unsafe {
            std::env::remove_var("CLOUDCAFE_TEST_EXPAND_VAR");
        }
    }

    // sections

    #[test]
    fn parse_empty_config() {
        let config = CafeConfig::from_toml_str_with_env("", no_env()).unwrap();
        assert_eq!(config.section_names().count(), 0);
        let http: HttpConfig = config.get().unwrap();
        assert_eq!(http.max_retries, 3);
        assert!(http.verify_ssl);
    }

    #[test]
    fn parse_user_auth_config() {
        let config = CafeConfig::from_toml_str_with_env(SAMPLE, no_env()).unwrap();
        let auth = config.user_auth().unwrap();
        assert_eq!(auth.endpoint, "http://keystone:5000");
        assert_eq!(auth.strategy, AuthStrategy::RaxAuth);
        assert_eq!(auth.serialize_format, Format::Json);
        assert_eq!(auth.deserialize_format, Format::Xml);
    }

    #[test]
    fn missing_user_auth_section_is_reported() {
        let config = CafeConfig::from_toml_str_with_env("[user]\nusername = \"x\"", no_env())
            .unwrap();
        let err = config.user_auth().unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection { .. }));
        assert_eq!(err.section(), Some("user_auth_config"));
    }

    #[test]
    fn user_secrets_are_redacted_in_debug() {
        let config = CafeConfig::from_toml_str_with_env(SAMPLE, no_env()).unwrap();
        let user: UserConfig = config.get().unwrap();
        let rendered = format!("{user:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("abc123"));
        assert_eq!(user.api_key.unwrap().expose_secret(), "abc123");
    }

    #[test]
    fn partial_section_keeps_defaults() {
        let config = CafeConfig::from_toml_str_with_env(SAMPLE, no_env()).unwrap();
        let storage: BlockStorageConfig = config.get().unwrap();
        assert_eq!(storage.min_volume_size, 2);
        assert_eq!(storage.volume_create_max_timeout, 900);
        assert_eq!(storage.volume_create_min_timeout, 1);
        assert_eq!(storage.default_volume_type.as_deref(), Some("lvm"));
        assert!(storage.cleanup_on_failure);
    }

    #[test]
    fn endpoint_defaults_catalog_name() {
        let config = CafeConfig::from_toml_str_with_env(SAMPLE, no_env()).unwrap();
        let endpoint = config.endpoint(Service::BlockStorage).unwrap();
        assert_eq!(endpoint.service_name, "cinderv2");
        assert_eq!(endpoint.region.as_deref(), Some("RegionOne"));
        assert_eq!(endpoint.interface, EndpointInterface::Internal);

        let compute = config.endpoint(Service::Compute).unwrap();
        assert_eq!(compute.service_name, "nova");
        assert!(compute.region.is_none());
    }

    #[test]
    fn wrong_type_is_invalid_section() {
        let config = CafeConfig::from_toml_str_with_env(
            "[blockstorage]\nmin_volume_size = \"big\"",
            no_env(),
        )
        .unwrap();
        let err = config.get::<BlockStorageConfig>().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { ref section, .. } if section == "blockstorage"
        ));
    }

    #[test]
    fn scalar_section_is_invalid() {
        let config = CafeConfig::from_toml_str_with_env("http = 3", no_env()).unwrap();
        assert!(matches!(
            config.get::<HttpConfig>(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn datasets_filters_accept_scalars_and_lists() {
        let config = CafeConfig::from_toml_str_with_env(
            r#"
[datasets]
max_datasets = 3
randomize = true

[datasets.images.include]
name = ["cirros", "fedora"]

[datasets.glance_images.include]
status = "active"

[datasets.flavors.exclude]
ram = 512
"#,
            no_env(),
        )
        .unwrap();
        let datasets: DatasetsConfig = config.get().unwrap();
        assert_eq!(datasets.max_datasets, Some(3));
        assert!(datasets.randomize);
        assert_eq!(datasets.images.include["name"], vec!["cirros", "fedora"]);
        assert!(!datasets.images.include.contains_key("status"));
        assert_eq!(datasets.glance_images.include["status"], vec!["active"]);
        assert_eq!(datasets.flavors.exclude["ram"], vec!["512"]);
        assert!(datasets.volume_types.is_empty());
    }

    // overrides

    #[test]
    fn env_override_coerces_types() {
        let config = CafeConfig::from_toml_str_with_env(
            SAMPLE,
            vars(&[
                ("CAFE_http_max_retries", "7"),
                ("CAFE_http_verify_ssl", "False"),
                ("CAFE_blockstorage_volume_create_max_timeout", "30"),
            ]),
        )
        .unwrap();
        let http: HttpConfig = config.get().unwrap();
        assert_eq!(http.max_retries, 7);
        assert!(!http.verify_ssl);
        let storage: BlockStorageConfig = config.get().unwrap();
        assert_eq!(storage.volume_create_max_timeout, 30);
    }

    #[test]
    fn env_override_keeps_existing_strings() {
        let config = CafeConfig::from_toml_str_with_env(
            "[user]\nusername = \"demo\"\npassword = \"old\"",
            vars(&[("CAFE_user_password", "12345")]),
        )
        .unwrap();
        let user: UserConfig = config.get().unwrap();
        assert_eq!(user.password.unwrap().expose_secret(), "12345");
    }

    #[test]
    fn env_override_prefers_longest_section() {
        let config = CafeConfig::from_toml_str_with_env(
            SAMPLE,
            vars(&[("CAFE_user_auth_config_endpoint", "http://other:5000")]),
        )
        .unwrap();
        assert_eq!(config.user_auth().unwrap().endpoint, "http://other:5000");
        assert!(config.value("user", "auth_config_endpoint").is_none());
    }

    #[test]
    fn env_override_is_case_sensitive() {
        let config = CafeConfig::from_toml_str_with_env(
            SAMPLE,
            vars(&[("CAFE_HTTP_MAX_RETRIES", "9"), ("OTHER_http_max_retries", "9")]),
        )
        .unwrap();
        assert_eq!(config.get::<HttpConfig>().unwrap().max_retries, 3);
    }

    #[test]
    fn coerce_order() {
        assert_eq!(coerce("true"), toml::Value::Boolean(true));
        assert_eq!(coerce("42"), toml::Value::Integer(42));
        assert_eq!(coerce("1.5"), toml::Value::Float(1.5));
        assert_eq!(coerce("abc"), toml::Value::String("abc".to_string()));
    }

    #[test]
    fn coerce_keeps_text_that_would_change() {
        assert_eq!(coerce("007"), toml::Value::String("007".to_string()));
        assert_eq!(coerce("1.10"), toml::Value::String("1.10".to_string()));
    }

    #[test]
    fn numeric_override_of_undeclared_string_field_loads() {
        let config = CafeConfig::from_toml_str_with_env(
            "[compute]\nimage_ref = \"img\"\n[user]\nusername = \"demo\"",
            vars(&[
                ("CAFE_compute_flavor_ref", "1"),
                ("CAFE_user_password", "12345"),
                ("CAFE_user_tenant_id", "42"),
                ("CAFE_baremetal_api_version", "1.10"),
            ]),
        )
        .unwrap();
        let compute: ComputeConfig = config.get().unwrap();
        assert_eq!(compute.image_ref.as_deref(), Some("img"));
        assert_eq!(compute.flavor_ref.as_deref(), Some("1"));
        let user: UserConfig = config.get().unwrap();
        assert_eq!(user.password.unwrap().expose_secret(), "12345");
        assert_eq!(user.tenant_id.as_deref(), Some("42"));
        let bare_metal: BareMetalConfig = config.get().unwrap();
        assert_eq!(bare_metal.api_version.as_deref(), Some("1.10"));
    }

    #[test]
    fn string_fields_accept_scalars_in_the_file() {
        let config = CafeConfig::from_toml_str_with_env(
            "[compute]\nflavor_ref = 2\n[images]\ndisk_format = \"qcow2\"",
            no_env(),
        )
        .unwrap();
        assert_eq!(config.get::<ComputeConfig>().unwrap().flavor_ref.as_deref(), Some("2"));
        assert_eq!(config.get::<ImagesConfig>().unwrap().disk_format, "qcow2");
    }

    // loading

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = CafeConfig::load_from(&path).unwrap();
        assert_eq!(config.path(), Some(path.as_path()));
        assert!(config.has_section("blockstorage"));
    }

    #[test]
    fn load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = CafeConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[test]
    fn parse_error_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "invalid toml [").unwrap();
        let err = CafeConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
    }
}
