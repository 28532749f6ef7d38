//! Loading config files from disk and layering env overrides.

use cloudcafe_config::{
    AuthStrategy, BlockStorageConfig, CafeConfig, ComputeConfig, ConfigError, DatasetsConfig,
    Service, UserConfig,
};

use crate::common::config_file;

const CONFIG: &str = r#"
[user_auth_config]
endpoint = "https://identity.example:5000"

[user]
username = "demo"
password = "secret"

[compute]
image_ref = "img-1"
flavor_ref = "1"

[blockstorage_endpoint]
region = "RegionTwo"

[datasets]
max_datasets = 3

[datasets.images.include]
status = ["ACTIVE"]
"#;

#[test]
fn file_sections_deserialize_with_defaults() {
    let (_dir, path) = config_file(CONFIG);
    let config = CafeConfig::load_from(&path).unwrap();
    assert_eq!(config.path(), Some(path.as_path()));

    let user: UserConfig = config.get().unwrap();
    assert_eq!(user.username.as_deref(), Some("demo"));
    assert_eq!(config.user_auth().unwrap().strategy, AuthStrategy::Keystone);

    let compute: ComputeConfig = config.get().unwrap();
    assert_eq!(compute.image_ref.as_deref(), Some("img-1"));
    assert_eq!(compute.server_build_timeout, 600);

    let block_storage: BlockStorageConfig = config.get().unwrap();
    assert_eq!(block_storage.min_volume_size, 1);

    let endpoint = config.endpoint(Service::BlockStorage).unwrap();
    assert_eq!(endpoint.service_name, "cinderv2");
    assert_eq!(endpoint.region.as_deref(), Some("RegionTwo"));

    let datasets: DatasetsConfig = config.get().unwrap();
    assert_eq!(datasets.max_datasets, Some(3));
    assert_eq!(datasets.images.include["status"], ["ACTIVE"]);
    assert!(datasets.flavors.is_empty());
}

#[test]
fn env_overrides_win_over_the_file() {
    let vars = vec![
        ("CAFE_compute_server_build_timeout".to_string(), "45".to_string()),
        ("CAFE_user_auth_config_strategy".to_string(), "rax_auth".to_string()),
        ("CAFE_user_username".to_string(), "override".to_string()),
        ("UNRELATED".to_string(), "1".to_string()),
    ];
    let config = CafeConfig::from_toml_str_with_env(CONFIG, vars).unwrap();

    let compute: ComputeConfig = config.get().unwrap();
    assert_eq!(compute.server_build_timeout, 45);
    assert_eq!(config.user_auth().unwrap().strategy, AuthStrategy::RaxAuth);
    let user: UserConfig = config.get().unwrap();
    assert_eq!(user.username.as_deref(), Some("override"));
}

#[test]
fn missing_and_malformed_files_report_their_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = CafeConfig::load_from(&missing).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
    assert_eq!(err.path(), Some(missing.as_path()));

    let (_dir, path) = config_file("[user\nusername = ");
    let err = CafeConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert_eq!(err.path(), Some(path.as_path()));
}

#[test]
fn missing_auth_section_is_reported_by_name() {
    let config = CafeConfig::from_toml_str_with_env("[user]\nusername = \"x\"\n", Vec::new())
        .unwrap();
    let err = config.user_auth().unwrap_err();
    assert_eq!(err.section(), Some("user_auth_config"));
}
