//! Object storage over Swift TempAuth.

use cloudcafe_composites::CloudComposite;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{config, sequence};

async fn tempauth_cloud(server: &MockServer) -> CloudComposite {
    let storage_url = format!("{}/v1/AUTH_test", server.uri());
    Mock::given(method("GET"))
        .and(path("/auth/v1.0"))
        .and(header("X-Auth-User", "test:tester"))
        .and(header("X-Auth-Key", "testing"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Auth-Token", "AUTH_tk1")
                .insert_header("X-Storage-Url", storage_url.as_str()),
        )
        .expect(1)
        .mount(server)
        .await;

    let config = config(&format!(
        r#"
        [user_auth_config]
        endpoint = "{}"
        strategy = "saio_tempauth"

        [user]
        username = "test:tester"
        api_key = "testing"

        [http]
        max_retries = 0

        [objectstorage]
        listing_timeout = 10
        listing_poll_interval = 0
        default_content_type = "text/plain"
        "#,
        server.uri()
    ));
    CloudComposite::new(config).unwrap()
}

fn object(name: &str) -> serde_json::Value {
    json!({"name": name, "hash": "abc", "bytes": 3, "content_type": "text/plain"})
}

#[tokio::test]
async fn container_round_trip_through_tempauth() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/AUTH_test/logs"))
        .and(header("X-Auth-Token", "AUTH_tk1"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    for name in ["a.txt", "b.txt"] {
        Mock::given(method("PUT"))
            .and(path(format!("/v1/AUTH_test/logs/{name}")))
            .and(header("content-type", "text/plain"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("/v1/AUTH_test/logs/{name}")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/v1/AUTH_test/logs"))
        .and(query_param("marker", "b.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/AUTH_test/logs"))
        .respond_with(sequence(vec![
            json!([object("a.txt")]),
            json!([object("a.txt"), object("b.txt")]),
        ]))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/AUTH_test/logs"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let cloud = tempauth_cloud(&server).await;
    let storage = cloud.object_storage().await.unwrap();
    let behaviors = storage.behaviors();

    let objects = [("a.txt", b"one".as_slice()), ("b.txt", b"two".as_slice())];
    let container = behaviors
        .create_container_with_objects(Some("logs"), &objects)
        .await
        .unwrap();
    assert_eq!(container, "logs");

    let listed = behaviors.wait_for_object_count("logs", 2).await.unwrap();
    assert_eq!(listed.len(), 2);

    let deleted = behaviors.delete_container_recursive("logs").await.unwrap();
    assert_eq!(deleted, 2);
}

#[tokio::test]
async fn tempauth_has_no_catalog() {
    let server = MockServer::start().await;
    let cloud = tempauth_cloud(&server).await;
    assert_eq!(
        cloud.auth().token().await.unwrap().expose_secret(),
        "AUTH_tk1"
    );
    assert!(cloud.auth().access().await.is_err());
}
