//! Command bodies. Each returns the text to print so it can be tested
//! without capturing stdout.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use cloudcafe_composites::CloudComposite;
use cloudcafe_config::{CafeConfig, DatasetsConfig, Service};
use cloudcafe_datasets::{DatasetList, bare_metal, block_storage, compute, images};

use crate::DatasetKind;

pub fn sections(config: &CafeConfig) -> String {
    let mut out = String::new();
    if let Some(path) = config.path() {
        let _ = writeln!(out, "# {}", path.display());
    }
    for name in config.section_names() {
        let _ = writeln!(out, "[{name}]");
    }
    out
}

/// One line per service. A service that fails to resolve prints its error
/// instead of a URL so the rest are still shown.
pub async fn endpoints(cloud: &CloudComposite) -> String {
    let mut out = String::new();
    for service in Service::ALL {
        let resolved = match cloud.config().endpoint(service) {
            Ok(endpoint) => cloud
                .auth()
                .service_url(&endpoint)
                .await
                .map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };
        match resolved {
            Ok(url) => {
                let _ = writeln!(out, "{:<15} {url}", service.section());
            }
            Err(err) => {
                tracing::warn!(
                    service = service.section(),
                    error = %err,
                    "Endpoint did not resolve"
                );
                let _ = writeln!(out, "{:<15} error: {err}", service.section());
            }
        }
    }
    out
}

pub async fn datasets(cloud: &CloudComposite, kind: DatasetKind) -> Result<String> {
    let config: DatasetsConfig = cloud.config().get().context("invalid [datasets] section")?;
    let out = match kind {
        DatasetKind::Images => {
            let compute_composite = cloud.compute().await?;
            render(&compute::images(&compute_composite, &config).await?)
        }
        DatasetKind::Flavors => {
            let compute_composite = cloud.compute().await?;
            render(&compute::flavors(&compute_composite, &config).await?)
        }
        DatasetKind::VolumeTypes => {
            let volumes = cloud.block_storage().await?;
            render(&block_storage::volume_types(&volumes, &config).await?)
        }
        DatasetKind::VolumeTypesWithImages => {
            let compute_composite = cloud.compute().await?;
            let datasets =
                block_storage::volume_types_with_images(&compute_composite, &config).await?;
            render(&datasets)
        }
        DatasetKind::ImageFormats => {
            let images_composite = cloud.images().await?;
            render(&images::images_by_format(&images_composite, &config).await?)
        }
        DatasetKind::Drivers => {
            let bare_metal_composite = cloud.bare_metal().await?;
            render(&bare_metal::drivers(&bare_metal_composite, &config).await?)
        }
    };
    Ok(out)
}

fn render<T>(datasets: &DatasetList<T>) -> String {
    let mut out = String::new();
    for dataset in datasets {
        if dataset.tags.is_empty() {
            let _ = writeln!(out, "{}", dataset.name);
        } else {
            let tags: Vec<&str> = dataset.tags.iter().map(String::as_str).collect();
            let _ = writeln!(out, "{} [{}]", dataset.name, tags.join(", "));
        }
    }
    out
}
