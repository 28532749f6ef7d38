//! Compute and block storage reached through one authenticated cloud.

use std::sync::Arc;

use cloudcafe_behaviors::block_storage::VolumeRequest;
use cloudcafe_behaviors::compute::ServerRequest;
use cloudcafe_composites::CloudComposite;
use cloudcafe_config::CafeConfig;
use cloudcafe_types::status::{ServerStatus, VolumeStatus};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{config_file, keystone_config, mount_keystone, present_then_gone, sequence};

const SERVICES: &[(&str, &str, &str)] = &[
    ("nova", "compute", "compute/v2/t-1"),
    ("cinderv2", "volumev2", "volume/v2/t-1"),
];

const SECTIONS: &str = r#"
[compute]
image_ref = "img-1"
flavor_ref = "2"
server_status_interval = 0
server_build_timeout = 30
server_delete_timeout = 30

[blockstorage]
volume_status_poll_frequency = 0
"#;

async fn cloud(server: &MockServer) -> CloudComposite {
    mount_keystone(server, SERVICES).await;
    let (_dir, path) = config_file(&keystone_config(server, SECTIONS));
    CloudComposite::new(CafeConfig::load_from(&path).unwrap()).unwrap()
}

fn server_body(status: &str) -> serde_json::Value {
    json!({"server": {"id": "srv-1", "name": "web", "status": status}})
}

fn volume_body(status: &str) -> serde_json::Value {
    json!({"volume": {"id": "vol-1", "size": 2, "status": status}})
}

#[tokio::test]
async fn boots_server_and_volume_with_one_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compute/v2/t-1/servers"))
        .and(header("X-Auth-Token", "tok-integration"))
        .and(body_json(json!({
            "server": {"name": "web", "imageRef": "img-1", "flavorRef": "2"}
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "server": {"id": "srv-1", "adminPass": "pw"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/compute/v2/t-1/servers/srv-1"))
        .respond_with(sequence(vec![server_body("BUILD"), server_body("ACTIVE")]))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/volume/v2/t-1/volumes"))
        .and(header("X-Auth-Token", "tok-integration"))
        .respond_with(ResponseTemplate::new(202).set_body_json(volume_body("creating")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/volume/v2/t-1/volumes/vol-1"))
        .respond_with(sequence(vec![
            volume_body("creating"),
            volume_body("available"),
        ]))
        .mount(&server)
        .await;

    let cloud = cloud(&server).await;
    let compute = cloud.compute().await.unwrap();
    let request = ServerRequest {
        name: Some("web".to_string()),
        ..ServerRequest::default()
    };
    let booted = compute
        .behaviors()
        .create_active_server(request)
        .await
        .unwrap();
    assert_eq!(booted.status, ServerStatus::Active);

    let volumes = compute.block_storage().await.unwrap();
    assert!(Arc::ptr_eq(&volumes, &cloud.block_storage().await.unwrap()));
    let volume = volumes
        .behaviors()
        .create_available_volume(VolumeRequest {
            size: Some(2),
            ..VolumeRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(volume.status, VolumeStatus::Available);
}

#[tokio::test]
async fn deletes_are_confirmed_by_404() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/compute/v2/t-1/servers/srv-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/compute/v2/t-1/servers/srv-1"))
        .respond_with(present_then_gone(server_body("ACTIVE"), 2))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/volume/v2/t-1/volumes/vol-1"))
        .respond_with(present_then_gone(volume_body("deleting"), 2))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/volume/v2/t-1/volumes/vol-1"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let cloud = cloud(&server).await;
    let compute = cloud.compute().await.unwrap();
    compute
        .behaviors()
        .delete_server_confirmed("srv-1")
        .await
        .unwrap();
    let volumes = cloud.block_storage().await.unwrap();
    volumes
        .behaviors()
        .delete_volume_confirmed("vol-1")
        .await
        .unwrap();
}

#[tokio::test]
async fn server_that_errors_is_cleaned_up() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/compute/v2/t-1/servers"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "server": {"id": "srv-1"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/compute/v2/t-1/servers/srv-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_body("ERROR")))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/compute/v2/t-1/servers/srv-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let cloud = cloud(&server).await;
    let compute = cloud.compute().await.unwrap();
    let err = compute
        .behaviors()
        .create_active_server(ServerRequest::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("srv-1"), "{err}");
}
