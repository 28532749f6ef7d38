use cloudcafe_composites::CloudComposite;
use cloudcafe_config::CafeConfig;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A cloud whose catalog points every service at `server`, under
/// `/compute`, `/volume`, `/image` and `/baremetal`.
pub(crate) async fn cloud(server: &MockServer) -> CloudComposite {
    let uri = server.uri();
    let entry = |name: &str, kind: &str, prefix: &str| {
        json!({
            "name": name,
            "type": kind,
            "endpoints": [{"publicURL": format!("{uri}/{prefix}")}]
        })
    };
    Mock::given(method("POST"))
        .and(path("/v2.0/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": {
            "token": {"id": "tok-1"},
            "serviceCatalog": [
                entry("nova", "compute", "compute"),
                entry("cinderv2", "volumev2", "volume"),
                entry("glance", "image", "image"),
                entry("ironic", "baremetal", "baremetal")
            ]
        }})))
        .mount(server)
        .await;

    let toml = format!(
        r#"
        [user_auth_config]
        endpoint = "{uri}"

        [user]
        username = "demo"
        password = "secret"

        [http]
        max_retries = 0
        "#
    );
    let config = CafeConfig::from_toml_str_with_env(&toml, Vec::new()).unwrap();
    CloudComposite::new(config).unwrap()
}
