//! Shared fixtures: mock identity services and config files.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cloudcafe_config::CafeConfig;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Mount a keystone v2.0 token endpoint whose catalog maps each
/// `(name, type, prefix)` to `{server}/{prefix}`.
pub async fn mount_keystone(server: &MockServer, services: &[(&str, &str, &str)]) {
    let uri = server.uri();
    let catalog: Vec<Value> = services
        .iter()
        .map(|(name, kind, prefix)| {
            json!({
                "name": name,
                "type": kind,
                "endpoints": [{"region": "RegionOne", "publicURL": format!("{uri}/{prefix}")}]
            })
        })
        .collect();
    Mock::given(method("POST"))
        .and(path("/v2.0/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": {
            "token": {"id": "tok-integration", "expires": "2030-01-01T00:00:00Z"},
            "serviceCatalog": catalog
        }})))
        .expect(1)
        .mount(server)
        .await;
}

/// Config text for keystone auth against `server`, followed by `extra`.
pub fn keystone_config(server: &MockServer, extra: &str) -> String {
    format!(
        r#"
[user_auth_config]
endpoint = "{}"
strategy = "keystone"

[user]
username = "demo"
password = "secret"
tenant_name = "demo"

[http]
max_retries = 0

{extra}
"#,
        server.uri()
    )
}

/// Parse config text without consulting the process environment.
pub fn config(content: &str) -> CafeConfig {
    CafeConfig::from_toml_str_with_env(content, Vec::new()).unwrap()
}

/// Write `content` to `config.toml` in a fresh temp dir. Keep the dir alive
/// for as long as the file is needed.
pub fn config_file(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

/// Answers 200 with each body in turn, repeating the last one.
pub fn sequence(
    bodies: Vec<Value>,
) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync + 'static {
    let calls = Arc::new(AtomicUsize::new(0));
    move |_: &Request| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        ResponseTemplate::new(200).set_body_json(bodies[n.min(bodies.len() - 1)].clone())
    }
}

/// Answers 200 with `body` for the first `times` calls, then 404.
pub fn present_then_gone(
    body: Value,
    times: usize,
) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync + 'static {
    let calls = Arc::new(AtomicUsize::new(0));
    move |_: &Request| {
        if calls.fetch_add(1, Ordering::SeqCst) < times {
            ResponseTemplate::new(200).set_body_json(body.clone())
        } else {
            ResponseTemplate::new(404)
        }
    }
}
