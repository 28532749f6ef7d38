//! JSON/XML marshalling for API models.
//!
//! OpenStack APIs wrap most resources in a root key (`{"volume": {...}}`) and
//! lists in a plural key (`{"volumes": [...]}`). The XML dialects use the same
//! names for the root element and the list element. Models declare those names
//! through [`Envelope`] and [`Collection`]; the free functions here do the
//! wrapping so the models themselves stay plain serde structs.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Wire format for request and response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Xml,
}

impl Format {
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, MarshalError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            other => Err(MarshalError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write XML payload: {0}")]
    XmlSerialize(String),
    #[error("invalid XML payload: {0}")]
    XmlDeserialize(String),
    #[error("payload is missing root key `{0}`")]
    MissingRoot(&'static str),
    #[error("unknown serialization format `{0}`")]
    UnknownFormat(String),
}

/// Root naming for a single resource.
pub trait Envelope {
    /// JSON wrapper key and XML root element (`"volume"`).
    const ROOT: &'static str;
    /// Whether the JSON form is wrapped in `{ROOT: ...}`.
    const JSON_WRAPPED: bool = true;
}

/// Root naming for resource listings.
pub trait Collection: Envelope {
    /// JSON list key and XML list element (`"volumes"`).
    const COLLECTION: &'static str;
}

pub fn serialize<T>(format: Format, value: &T) -> Result<String, MarshalError>
where
    T: Envelope + Serialize,
{
    match format {
        Format::Json => to_json(value),
        Format::Xml => to_xml(value),
    }
}

pub fn deserialize<T>(format: Format, body: &str) -> Result<T, MarshalError>
where
    T: Envelope + DeserializeOwned,
{
    match format {
        Format::Json => from_json(body),
        Format::Xml => from_xml(body),
    }
}

pub fn deserialize_list<T>(format: Format, body: &str) -> Result<Vec<T>, MarshalError>
where
    T: Collection + DeserializeOwned,
{
    match format {
        Format::Json => list_from_json(body),
        Format::Xml => list_from_xml(body),
    }
}

pub fn to_json<T>(value: &T) -> Result<String, MarshalError>
where
    T: Envelope + Serialize,
{
    if !T::JSON_WRAPPED {
        return Ok(serde_json::to_string(value)?);
    }
    let mut root = Map::new();
    root.insert(T::ROOT.to_string(), serde_json::to_value(value)?);
    Ok(Value::Object(root).to_string())
}

pub fn from_json<T>(body: &str) -> Result<T, MarshalError>
where
    T: Envelope + DeserializeOwned,
{
    let value: Value = serde_json::from_str(body)?;
    let inner = if T::JSON_WRAPPED {
        take_root(value, T::ROOT)?
    } else {
        value
    };
    Ok(serde_json::from_value(inner)?)
}

pub fn list_from_json<T>(body: &str) -> Result<Vec<T>, MarshalError>
where
    T: Collection + DeserializeOwned,
{
    let value: Value = serde_json::from_str(body)?;
    let items = take_root(value, T::COLLECTION)?;
    Ok(serde_json::from_value(items)?)
}

pub fn to_xml<T>(value: &T) -> Result<String, MarshalError>
where
    T: Envelope + Serialize,
{
    quick_xml::se::to_string_with_root(T::ROOT, value)
        .map_err(|e| MarshalError::XmlSerialize(e.to_string()))
}

/// The root element name is not checked; quick-xml deserializes the
/// children of whatever element comes first.
pub fn from_xml<T>(body: &str) -> Result<T, MarshalError>
where
    T: DeserializeOwned,
{
    quick_xml::de::from_str(body).map_err(|e| MarshalError::XmlDeserialize(e.to_string()))
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct XmlCollection<T> {
    #[serde(rename = "$value", default)]
    items: Vec<T>,
}

pub fn list_from_xml<T>(body: &str) -> Result<Vec<T>, MarshalError>
where
    T: Collection + DeserializeOwned,
{
    if body.trim().is_empty() {
        return Err(MarshalError::MissingRoot(T::COLLECTION));
    }
    let list: XmlCollection<T> = from_xml(body)?;
    Ok(list.items)
}

fn take_root(value: Value, key: &'static str) -> Result<Value, MarshalError> {
    match value {
        Value::Object(mut map) => map.remove(key).ok_or(MarshalError::MissingRoot(key)),
        _ => Err(MarshalError::MissingRoot(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: String,
        size: u64,
    }

    impl Envelope for Widget {
        const ROOT: &'static str = "widget";
    }

    impl Collection for Widget {
        const COLLECTION: &'static str = "widgets";
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Bare {
        id: String,
    }

    impl Envelope for Bare {
        const ROOT: &'static str = "bare";
        const JSON_WRAPPED: bool = false;
    }

    #[test]
    fn json_wraps_in_root_key() {
        let widget = Widget {
            id: "w-1".to_string(),
            size: 3,
        };
        let json = to_json(&widget).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["widget"]["id"], "w-1");
        assert_eq!(value["widget"]["size"], 3);
    }

    #[test]
    fn json_unwraps_root_key() {
        let widget: Widget = from_json(r#"{"widget": {"id": "w-2", "size": 5}}"#).unwrap();
        assert_eq!(widget.id, "w-2");
        assert_eq!(widget.size, 5);
    }

    #[test]
    fn json_missing_root_is_reported() {
        let err = from_json::<Widget>(r#"{"gadget": {"id": "x", "size": 1}}"#).unwrap_err();
        assert!(matches!(err, MarshalError::MissingRoot("widget")));
    }

    #[test]
    fn unwrapped_models_skip_root() {
        let bare = Bare {
            id: "b".to_string(),
        };
        assert_eq!(to_json(&bare).unwrap(), r#"{"id":"b"}"#);
        let parsed: Bare = from_json(r#"{"id": "b"}"#).unwrap();
        assert_eq!(parsed, bare);
    }

    #[test]
    fn json_list_uses_collection_key() {
        let body = r#"{"widgets": [{"id": "a", "size": 1}, {"id": "b", "size": 2}]}"#;
        let widgets: Vec<Widget> = list_from_json(body).unwrap();
        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[1].id, "b");
    }

    #[test]
    fn json_list_without_key_fails() {
        assert!(matches!(
            list_from_json::<Widget>(r#"{"items": []}"#),
            Err(MarshalError::MissingRoot("widgets"))
        ));
    }

    #[test]
    fn xml_writes_root_element() {
        let widget = Widget {
            id: "w-3".to_string(),
            size: 7,
        };
        let xml = to_xml(&widget).unwrap();
        assert!(xml.starts_with("<widget>"));
        assert!(xml.contains("<id>w-3</id>"));
        assert!(xml.contains("<size>7</size>"));
    }

    #[test]
    fn xml_reads_child_elements() {
        let widget: Widget = from_xml("<widget><id>w-4</id><size>9</size></widget>").unwrap();
        assert_eq!(
            widget,
            Widget {
                id: "w-4".to_string(),
                size: 9
            }
        );
    }

    #[test]
    fn xml_list_reads_each_item() {
        let body = "<widgets>\
            <widget><id>a</id><size>1</size></widget>\
            <widget><id>b</id><size>2</size></widget>\
            </widgets>";
        let widgets: Vec<Widget> = list_from_xml(body).unwrap();
        let ids: Vec<(&str, u64)> = widgets.iter().map(|w| (w.id.as_str(), w.size)).collect();
        assert_eq!(ids, [("a", 1), ("b", 2)]);
        assert!(list_from_xml::<Widget>("<widgets/>").unwrap().is_empty());
    }

    #[test]
    fn empty_xml_list_body_is_an_error() {
        assert!(list_from_xml::<Widget>("   ").is_err());
    }

    #[test]
    fn format_parse_and_content_type() {
        assert_eq!(Format::parse("JSON").unwrap(), Format::Json);
        assert_eq!(Format::parse(" xml ").unwrap(), Format::Xml);
        assert!(Format::parse("yaml").is_err());
        assert_eq!(Format::Xml.content_type(), "application/xml");
        assert_eq!(Format::Json.to_string(), "json");
    }
}
