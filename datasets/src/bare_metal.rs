//! Bare metal driver datasets.

use cloudcafe_composites::BareMetalComposite;
use cloudcafe_config::DatasetsConfig;
use cloudcafe_types::bare_metal::Driver;

use crate::{DatasetError, DatasetList, filter_models};

/// One dataset per enabled driver, named after the driver.
pub async fn drivers(
    bare_metal: &BareMetalComposite,
    config: &DatasetsConfig,
) -> Result<DatasetList<Driver>, DatasetError> {
    let listed = bare_metal.client().list_drivers().await?.into_entity();
    let mut datasets = DatasetList::new();
    for driver in filter_models(listed, &config.drivers)? {
        let name = driver.name.clone();
        datasets.append_new_dataset(&name, driver)?;
    }
    datasets.apply_limits(config);
    tracing::info!(count = datasets.len(), "Built driver datasets");
    Ok(datasets)
}
