//! Dataset generators driven by the `[datasets]` section.

use cloudcafe_composites::CloudComposite;
use cloudcafe_config::DatasetsConfig;
use cloudcafe_datasets::{DatasetError, DatasetList, compute, images};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{config, keystone_config, mount_keystone};

const DATASETS: &str = r#"
[datasets.images.include]
status = "ACTIVE"

[datasets.glance_images.include]
status = "active"

[datasets.flavors.exclude]
"os-flavor-access:is_public" = false
"#;

async fn mount_listings(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/compute/images/detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"images": [
            {"id": "i-1", "name": "cirros-0.6", "status": "ACTIVE"},
            {"id": "i-2", "name": "fedora-39", "status": "SAVING"}
        ]})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/compute/flavors/detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"flavors": [
            {"id": "1", "name": "m1.tiny", "ram": 512, "vcpus": 1, "disk": 1,
             "os-flavor-access:is_public": true},
            {"id": "9", "name": "private", "ram": 512, "vcpus": 1, "disk": 1,
             "os-flavor-access:is_public": false}
        ]})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/image/v2/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"images": [
            {"id": "g-1", "name": "a", "status": "active", "disk_format": "qcow2"},
            {"id": "g-2", "name": "b", "status": "active", "disk_format": "raw"},
            {"id": "g-3", "name": "c", "status": "queued", "disk_format": "vhd"}
        ]})))
        .mount(server)
        .await;
}

async fn cloud(server: &MockServer) -> CloudComposite {
    mount_keystone(
        server,
        &[("nova", "compute", "compute"), ("glance", "image", "image")],
    )
    .await;
    mount_listings(server).await;
    CloudComposite::new(config(&keystone_config(server, DATASETS))).unwrap()
}

#[tokio::test]
async fn generators_honor_configured_filters() {
    let server = MockServer::start().await;
    let cloud = cloud(&server).await;
    let settings: DatasetsConfig = cloud.config().get().unwrap();
    let compute_composite = cloud.compute().await.unwrap();

    let images = compute::images(&compute_composite, &settings).await.unwrap();
    assert_eq!(images.names(), ["cirros_0_6"]);

    let flavors = compute::flavors(&compute_composite, &settings).await.unwrap();
    assert_eq!(flavors.names(), ["m1_tiny"]);
}

#[tokio::test]
async fn lists_combine_and_merge_with_tags() {
    let server = MockServer::start().await;
    let cloud = cloud(&server).await;
    let settings: DatasetsConfig = cloud.config().get().unwrap();
    let compute_composite = cloud.compute().await.unwrap();
    let images_composite = cloud.images().await.unwrap();

    let mut flavors = compute::flavors(&compute_composite, &settings).await.unwrap();
    flavors.apply_test_tags(["compute"]);
    let mut formats = images::images_by_format(&images_composite, &settings)
        .await
        .unwrap();
    formats.apply_test_tags(["images"]);
    assert_eq!(formats.names(), ["qcow2", "raw"]);

    let combined = cloudcafe_datasets::combine(&flavors, &formats).unwrap();
    assert_eq!(combined.names(), ["m1_tiny_qcow2", "m1_tiny_raw"]);
    let tags = &combined.get("m1_tiny_raw").unwrap().tags;
    assert!(tags.contains("compute") && tags.contains("images"));

    let mut names: DatasetList<&str> = DatasetList::new();
    names.append_new_dataset("qcow2", "existing").unwrap();
    let clash: DatasetList<&str> = formats
        .iter()
        .fold(DatasetList::new(), |mut list, dataset| {
            list.append_new_dataset(&dataset.name, "format").unwrap();
            list
        });
    let err = names.merge(clash).unwrap_err();
    assert!(matches!(err, DatasetError::Duplicate(name) if name == "qcow2"));
    assert_eq!(names.len(), 1);
}
