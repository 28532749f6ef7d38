//! Field-based filtering of API models.
//!
//! Models are compared through their JSON form, so a filter key is the wire
//! name of a field (`disk_format`, `os-flavor-access:is_public`). Dotted
//! keys reach into nested objects (`extra_specs.volume_backend_name`).
//! Strings, numbers and booleans all compare as their string form.

use std::collections::BTreeMap;

use cloudcafe_config::FilterConfig;
use serde::Serialize;
use serde_json::Value;

use crate::DatasetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Keep a model only when every listed field has an allowed value.
    Include,
    /// Drop a model when any listed field has a listed value.
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFilter {
    mode: FilterMode,
    fields: BTreeMap<String, Vec<String>>,
}

impl ModelFilter {
    #[must_use]
    pub fn new(mode: FilterMode, fields: BTreeMap<String, Vec<String>>) -> Self {
        Self { mode, fields }
    }

    #[must_use]
    pub fn include(fields: BTreeMap<String, Vec<String>>) -> Self {
        Self::new(FilterMode::Include, fields)
    }

    #[must_use]
    pub fn exclude(fields: BTreeMap<String, Vec<String>>) -> Self {
        Self::new(FilterMode::Exclude, fields)
    }

    #[must_use]
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether a model, given as its JSON value, passes this filter.
    #[must_use]
    pub fn matches(&self, model: &Value) -> bool {
        match self.mode {
            FilterMode::Include => self
                .fields
                .iter()
                .all(|(field, allowed)| field_matches(model, field, allowed)),
            FilterMode::Exclude => !self
                .fields
                .iter()
                .any(|(field, listed)| field_matches(model, field, listed)),
        }
    }

    pub fn matches_model<T: Serialize>(&self, model: &T) -> Result<bool, DatasetError> {
        Ok(self.matches(&serde_json::to_value(model)?))
    }
}

/// Keep the models that pass both halves of `config`.
pub fn filter_models<T: Serialize>(
    models: Vec<T>,
    config: &FilterConfig,
) -> Result<Vec<T>, DatasetError> {
    if config.is_empty() {
        return Ok(models);
    }
    let include = ModelFilter::include(config.include.clone());
    let exclude = ModelFilter::exclude(config.exclude.clone());
    let total = models.len();

    let mut kept = Vec::with_capacity(total);
    for model in models {
        let value = serde_json::to_value(&model)?;
        if include.matches(&value) && exclude.matches(&value) {
            kept.push(model);
        }
    }
    tracing::debug!(total, kept = kept.len(), "Filtered models");
    Ok(kept)
}

fn field_matches(model: &Value, field: &str, values: &[String]) -> bool {
    let Some(found) = lookup(model, field) else {
        return false;
    };
    match found {
        Value::Array(items) => items.iter().any(|item| scalar_in(item, values)),
        other => scalar_in(other, values),
    }
}

fn lookup<'a>(model: &'a Value, field: &str) -> Option<&'a Value> {
    if let Some(value) = model.get(field) {
        return Some(value);
    }
    field
        .split('.')
        .try_fold(model, |current, segment| current.get(segment))
}

fn scalar_in(value: &Value, values: &[String]) -> bool {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return false,
    };
    values.iter().any(|candidate| *candidate == text)
}
