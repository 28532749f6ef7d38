//! Image datasets from the image service.

use cloudcafe_composites::ImagesComposite;
use cloudcafe_config::DatasetsConfig;
use cloudcafe_types::images::Image;

use crate::{DatasetError, DatasetList, filter_models};

/// One dataset per disk format, named after the format and holding the first
/// listed image of that format. Images without a disk format are skipped.
pub async fn images_by_format(
    images: &ImagesComposite,
    config: &DatasetsConfig,
) -> Result<DatasetList<Image>, DatasetError> {
    let listed = images.client().list_images(&[]).await?.into_entity();
    let mut datasets = DatasetList::new();
    for image in filter_models(listed, &config.glance_images)? {
        let Some(format) = image.disk_format.clone() else {
            tracing::debug!(image = %image.id, "Skipping image without a disk format");
            continue;
        };
        if datasets.contains(&format) {
            continue;
        }
        datasets.append_new_dataset(&format, image)?;
    }
    datasets.apply_limits(config);
    tracing::info!(count = datasets.len(), "Built image format datasets");
    Ok(datasets)
}
