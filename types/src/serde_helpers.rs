//! Deserializers for the loosely typed corners of the compute API.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum ValueOrString<T> {
    Value(T),
    Str(String),
}

/// Boot-from-volume servers report `"image": ""` instead of an object.
pub(crate) fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<ValueOrString<T>>::deserialize(deserializer)? {
        Some(ValueOrString::Value(value)) => Ok(Some(value)),
        Some(ValueOrString::Str(_)) | None => Ok(None),
    }
}

/// Flavors report `"swap": ""` when no swap disk is configured.
pub(crate) fn number_or_empty<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<ValueOrString<u64>>::deserialize(deserializer)? {
        Some(ValueOrString::Value(value)) => Ok(value),
        Some(ValueOrString::Str(raw)) if raw.trim().is_empty() => Ok(0),
        Some(ValueOrString::Str(raw)) => raw.trim().parse().map_err(serde::de::Error::custom),
        None => Ok(0),
    }
}
