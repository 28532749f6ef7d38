//! Image service (v2) images, tasks and members.
//!
//! The v2 API returns bare objects for single resources, so every model here
//! sets `JSON_WRAPPED = false`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::marshal::{Collection, Envelope};
use crate::status::{ImageStatus, TaskStatus};

/// Content type required by `PATCH /v2/images/{id}`.
pub const JSON_PATCH_CONTENT_TYPE: &str = "application/openstack-images-v2.1-json-patch";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: ImageStatus,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub container_format: Option<String>,
    #[serde(default)]
    pub disk_format: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub virtual_size: Option<u64>,
    #[serde(default)]
    pub min_disk: u64,
    #[serde(default)]
    pub min_ram: u64,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub file: Option<String>,
    /// Any custom image property (`os_distro`, `hw_disk_bus`, ...).
    #[serde(flatten)]
    pub additional_properties: HashMap<String, Value>,
}

impl Envelope for Image {
    const ROOT: &'static str = "image";
    const JSON_WRAPPED: bool = false;
}

impl Collection for Image {
    const COLLECTION: &'static str = "images";
}

impl Image {
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.additional_properties.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_disk: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_ram: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(flatten)]
    pub properties: HashMap<String, String>,
}

impl Envelope for ImageCreate {
    const ROOT: &'static str = "image";
    const JSON_WRAPPED: bool = false;
}

impl ImageCreate {
    pub fn new(
        name: impl Into<String>,
        container_format: impl Into<String>,
        disk_format: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            container_format: Some(container_format.into()),
            disk_format: Some(disk_format.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = Some(visibility.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// One JSON-patch operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
    Replace { path: String, value: Value },
    Remove { path: String },
}

/// Body of `PATCH /v2/images/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ImagePatch(Vec<PatchOp>);

impl ImagePatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.0.push(PatchOp::Add {
            path: patch_path(attribute),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn replace(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.0.push(PatchOp::Replace {
            path: patch_path(attribute),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn remove(mut self, attribute: &str) -> Self {
        self.0.push(PatchOp::Remove {
            path: patch_path(attribute),
        });
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn operations(&self) -> &[PatchOp] {
        &self.0
    }
}

fn patch_path(attribute: &str) -> String {
    if attribute.starts_with('/') {
        attribute.to_string()
    } else {
        format!("/{attribute}")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl Envelope for Task {
    const ROOT: &'static str = "task";
    const JSON_WRAPPED: bool = false;
}

impl Collection for Task {
    const COLLECTION: &'static str = "tasks";
}

impl Task {
    /// Image created by a successful import task.
    #[must_use]
    pub fn image_id(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(|result| result.get("image_id"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportImageProperties {
    pub container_format: String,
    pub disk_format: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportTaskInput {
    pub import_from: String,
    pub import_from_format: String,
    pub image_properties: ImportImageProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskCreate {
    #[serde(rename = "type")]
    pub task_type: String,
    pub input: ImportTaskInput,
}

impl Envelope for TaskCreate {
    const ROOT: &'static str = "task";
    const JSON_WRAPPED: bool = false;
}

impl TaskCreate {
    pub fn import(
        import_from: impl Into<String>,
        import_from_format: impl Into<String>,
        container_format: impl Into<String>,
        disk_format: impl Into<String>,
    ) -> Self {
        Self {
            task_type: "import".to_string(),
            input: ImportTaskInput {
                import_from: import_from.into(),
                import_from_format: import_from_format.into(),
                image_properties: ImportImageProperties {
                    container_format: container_format.into(),
                    disk_format: disk_format.into(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageMember {
    pub image_id: String,
    pub member_id: String,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Envelope for ImageMember {
    const ROOT: &'static str = "member";
    const JSON_WRAPPED: bool = false;
}

impl Collection for ImageMember {
    const COLLECTION: &'static str = "members";
}

/// Body of `POST /v2/images/{id}/members`.
#[derive(Debug, Clone, Serialize)]
pub struct MemberCreate {
    pub member: String,
}

impl Envelope for MemberCreate {
    const ROOT: &'static str = "member";
    const JSON_WRAPPED: bool = false;
}
