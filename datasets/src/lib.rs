//! Named parameter sets for data-driven tests.
//!
//! A [`DatasetList`] is an ordered list of uniquely named [`Dataset`]s, one
//! per test case. The generator modules build lists from live API listings
//! narrowed by the `[datasets]` config section.

pub mod bare_metal;
pub mod block_storage;
pub mod compute;
mod filter;
pub mod images;
#[cfg(test)]
mod test_support;

use std::collections::BTreeSet;

use cloudcafe_clients::ClientError;
use cloudcafe_composites::CompositeError;
use cloudcafe_config::DatasetsConfig;
use cloudcafe_types::datagen::sanitize_name;
use rand::seq::SliceRandom;
use thiserror::Error;

pub use filter::{FilterMode, ModelFilter, filter_models};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset `{0}` already exists")]
    Duplicate(String),
    #[error("dataset name `{0}` is empty after sanitizing")]
    InvalidName(String),
    #[error("failed to inspect model for filtering: {0}")]
    Inspect(#[from] serde_json::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Composite(#[from] CompositeError),
}

/// One named test case.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<T> {
    pub name: String,
    pub data: T,
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetList<T> {
    datasets: Vec<Dataset<T>>,
}

impl<T> Default for DatasetList<T> {
    fn default() -> Self {
        Self {
            datasets: Vec::new(),
        }
    }
}

impl<T> DatasetList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset under a sanitized `name`. Names must stay unique.
    pub fn append_new_dataset(&mut self, name: &str, data: T) -> Result<(), DatasetError> {
        let sanitized = sanitize_name(name);
        if sanitized.is_empty() {
            return Err(DatasetError::InvalidName(name.to_string()));
        }
        if self.contains(&sanitized) {
            return Err(DatasetError::Duplicate(sanitized));
        }
        self.datasets.push(Dataset {
            name: sanitized,
            data,
            tags: BTreeSet::new(),
        });
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.datasets.iter().any(|dataset| dataset.name == name)
    }

    /// Add `tags` to every dataset currently in the list.
    pub fn apply_test_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        for dataset in &mut self.datasets {
            dataset.tags.extend(tags.iter().cloned());
        }
    }

    /// Append every dataset of `other`, rejecting name collisions. On error
    /// `self` is left unchanged.
    pub fn merge(&mut self, other: Self) -> Result<(), DatasetError> {
        if let Some(clash) = other.datasets.iter().find(|dataset| self.contains(&dataset.name)) {
            return Err(DatasetError::Duplicate(clash.name.clone()));
        }
        self.datasets.extend(other.datasets);
        Ok(())
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.datasets.iter().map(|dataset| dataset.name.as_str()).collect()
    }

    pub fn truncate(&mut self, len: usize) {
        self.datasets.truncate(len);
    }

    pub fn shuffle(&mut self) {
        self.datasets.shuffle(&mut rand::rng());
    }

    /// Apply `randomize` and then `max_datasets` from the config.
    pub fn apply_limits(&mut self, config: &DatasetsConfig) {
        if config.randomize {
            self.shuffle();
        }
        if let Some(max) = config.max_datasets {
            self.truncate(max);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Dataset<T>> {
        self.datasets.iter().find(|dataset| dataset.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dataset<T>> {
        self.datasets.iter()
    }
}

impl<T> IntoIterator for DatasetList<T> {
    type Item = Dataset<T>;
    type IntoIter = std::vec::IntoIter<Dataset<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.datasets.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a DatasetList<T> {
    type Item = &'a Dataset<T>;
    type IntoIter = std::slice::Iter<'a, Dataset<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.datasets.iter()
    }
}

/// Append under `name`, or `name_suffix` when that name is already taken.
/// An empty `name` uses `suffix` alone.
pub(crate) fn append_disambiguated<T>(
    datasets: &mut DatasetList<T>,
    name: &str,
    suffix: &str,
    data: T,
) -> Result<(), DatasetError> {
    let sanitized = sanitize_name(name);
    if sanitized.is_empty() {
        return datasets.append_new_dataset(suffix, data);
    }
    if datasets.contains(&sanitized) {
        return datasets.append_new_dataset(&format!("{sanitized}_{suffix}"), data);
    }
    datasets.append_new_dataset(&sanitized, data)
}

/// Cartesian product of two lists. Each dataset is named `a_b` and carries
/// the tags of both parents.
pub fn combine<A, B>(
    first: &DatasetList<A>,
    second: &DatasetList<B>,
) -> Result<DatasetList<(A, B)>, DatasetError>
where
    A: Clone,
    B: Clone,
{
    let mut combined = DatasetList::new();
    for a in first {
        for b in second {
            combined.append_new_dataset(
                &format!("{}_{}", a.name, b.name),
                (a.data.clone(), b.data.clone()),
            )?;
            if let Some(last) = combined.datasets.last_mut() {
                last.tags.extend(a.tags.iter().chain(&b.tags).cloned());
            }
        }
    }
    Ok(combined)
}
