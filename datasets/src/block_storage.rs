//! Volume type datasets, alone or crossed with compute images.

use cloudcafe_composites::{BlockStorageComposite, ComputeComposite};
use cloudcafe_config::DatasetsConfig;
use cloudcafe_types::block_storage::VolumeType;
use cloudcafe_types::compute::ComputeImage;

use crate::{DatasetError, DatasetList, append_disambiguated, combine, compute, filter_models};

/// One dataset per volume type, named after the type.
pub async fn volume_types(
    block_storage: &BlockStorageComposite,
    config: &DatasetsConfig,
) -> Result<DatasetList<VolumeType>, DatasetError> {
    let mut datasets = unlimited_volume_types(block_storage, config).await?;
    datasets.apply_limits(config);
    tracing::info!(count = datasets.len(), "Built volume type datasets");
    Ok(datasets)
}

/// Every pairing of a volume type with a compute image, named
/// `<volume type>_<image>`. Limits apply to the combined list.
pub async fn volume_types_with_images(
    compute: &ComputeComposite,
    config: &DatasetsConfig,
) -> Result<DatasetList<(VolumeType, ComputeImage)>, DatasetError> {
    let block_storage = compute.block_storage().await?;
    let types = unlimited_volume_types(&block_storage, config).await?;
    let images = compute::unlimited_images(compute, config).await?;

    let mut datasets = combine(&types, &images)?;
    datasets.apply_limits(config);
    tracing::info!(
        volume_types = types.len(),
        images = images.len(),
        count = datasets.len(),
        "Built volume type and image datasets"
    );
    Ok(datasets)
}

async fn unlimited_volume_types(
    block_storage: &BlockStorageComposite,
    config: &DatasetsConfig,
) -> Result<DatasetList<VolumeType>, DatasetError> {
    let types = block_storage
        .client()
        .list_volume_types()
        .await?
        .into_entity();
    let mut datasets = DatasetList::new();
    for volume_type in filter_models(types, &config.volume_types)? {
        let (name, id) = (volume_type.name.clone(), volume_type.id.clone());
        append_disambiguated(&mut datasets, &name, &id, volume_type)?;
    }
    Ok(datasets)
}
