//! Datasets over the compute API: one per image and one per flavor.

use cloudcafe_composites::ComputeComposite;
use cloudcafe_config::DatasetsConfig;
use cloudcafe_types::compute::{ComputeImage, Flavor};

use crate::{DatasetError, DatasetList, append_disambiguated, filter_models};

/// One dataset per image visible to compute, named after the image.
pub async fn images(
    compute: &ComputeComposite,
    config: &DatasetsConfig,
) -> Result<DatasetList<ComputeImage>, DatasetError> {
    let mut datasets = unlimited_images(compute, config).await?;
    datasets.apply_limits(config);
    tracing::info!(count = datasets.len(), "Built compute image datasets");
    Ok(datasets)
}

/// One dataset per flavor, named after the flavor.
pub async fn flavors(
    compute: &ComputeComposite,
    config: &DatasetsConfig,
) -> Result<DatasetList<Flavor>, DatasetError> {
    let flavors = compute
        .client()
        .list_flavors_with_detail(&[])
        .await?
        .into_entity();
    let mut datasets = DatasetList::new();
    for flavor in filter_models(flavors, &config.flavors)? {
        let (name, id) = (flavor.name.clone(), flavor.id.clone());
        append_disambiguated(&mut datasets, &name, &id, flavor)?;
    }
    datasets.apply_limits(config);
    tracing::info!(count = datasets.len(), "Built flavor datasets");
    Ok(datasets)
}

pub(crate) async fn unlimited_images(
    compute: &ComputeComposite,
    config: &DatasetsConfig,
) -> Result<DatasetList<ComputeImage>, DatasetError> {
    let images = compute
        .client()
        .list_images_with_detail(&[])
        .await?
        .into_entity();
    let mut datasets = DatasetList::new();
    for image in filter_models(images, &config.images)? {
        let (name, id) = (image.name.clone(), image.id.clone());
        append_disambiguated(&mut datasets, &name, &id, image)?;
    }
    Ok(datasets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::cloud;
    use cloudcafe_config::FilterConfig;
    use serde_json::json;
    use std::collections::BTreeMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn image_datasets_are_filtered_and_named() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/compute/images/detail"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"images": [
                {"id": "i-1", "name": "Ubuntu 22.04", "status": "ACTIVE"},
                {"id": "i-2", "name": "Ubuntu 22.04", "status": "ACTIVE"},
                {"id": "i-3", "name": "broken", "status": "ERROR"}
            ]})))
            .mount(&server)
            .await;
        let compute = cloud(&server).await.compute().await.unwrap();
        let config = DatasetsConfig {
            images: FilterConfig {
                include: BTreeMap::from([("status".to_string(), vec!["ACTIVE".to_string()])]),
                ..FilterConfig::default()
            },
            ..DatasetsConfig::default()
        };

        let datasets = images(&compute, &config).await.unwrap();
        assert_eq!(datasets.names(), ["Ubuntu_22_04", "Ubuntu_22_04_i_2"]);
    }

    #[tokio::test]
    async fn flavor_datasets_honor_exclusions_and_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/compute/flavors/detail"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"flavors": [
                {"id": "1", "name": "m1.tiny", "ram": 512, "vcpus": 1, "disk": 1},
                {"id": "2", "name": "m1.small", "ram": 2048, "vcpus": 1, "disk": 20},
                {"id": "3", "name": "m1.medium", "ram": 4096, "vcpus": 2, "disk": 40}
            ]})))
            .mount(&server)
            .await;
        let compute = cloud(&server).await.compute().await.unwrap();
        let config = DatasetsConfig {
            flavors: FilterConfig {
                exclude: BTreeMap::from([("name".to_string(), vec!["m1.tiny".to_string()])]),
                ..FilterConfig::default()
            },
            max_datasets: Some(1),
            ..DatasetsConfig::default()
        };

        let datasets = flavors(&compute, &config).await.unwrap();
        assert_eq!(datasets.names(), ["m1_small"]);
        assert_eq!(datasets.get("m1_small").unwrap().data.ram, 2048);
    }
}
