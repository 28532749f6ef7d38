//! Block storage (v2) volumes, snapshots and volume types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::compute::Link;
use crate::marshal::{Collection, Envelope};
use crate::status::{SnapshotStatus, VolumeStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub volume_id: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub host_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Volume {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub size: u64,
    pub status: VolumeStatus,
    #[serde(default)]
    pub volume_type: Option<String>,
    #[serde(default)]
    pub availability_zone: Option<String>,
    #[serde(default)]
    pub bootable: Option<String>,
    #[serde(default)]
    pub encrypted: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub source_volid: Option<String>,
    #[serde(rename = "os-vol-tenant-attr:tenant_id", default)]
    pub tenant_id: Option<String>,
    #[serde(rename = "os-vol-host-attr:host", default)]
    pub host: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Envelope for Volume {
    const ROOT: &'static str = "volume";
}

impl Collection for Volume {
    const COLLECTION: &'static str = "volumes";
}

impl Volume {
    /// The API reports bootable as the strings `"true"` / `"false"`.
    #[must_use]
    pub fn is_bootable(&self) -> bool {
        self.bootable
            .as_deref()
            .is_some_and(|raw| raw.eq_ignore_ascii_case("true"))
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        !self.attachments.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumeCreate {
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_volid: Option<String>,
    #[serde(rename = "imageRef", skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl Envelope for VolumeCreate {
    const ROOT: &'static str = "volume";
}

impl VolumeCreate {
    #[must_use]
    pub fn new(size: u64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_volume_type(mut self, volume_type: impl Into<String>) -> Self {
        self.volume_type = Some(volume_type.into());
        self
    }

    #[must_use]
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    #[must_use]
    pub fn with_snapshot(mut self, snapshot_id: impl Into<String>) -> Self {
        self.snapshot_id = Some(snapshot_id.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

impl Envelope for VolumeUpdate {
    const ROOT: &'static str = "volume";
}

/// `POST /volumes/{id}/action` bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeAction {
    Extend { new_size: u64 },
    SetBootable(bool),
    ResetStatus(VolumeStatus),
}

impl VolumeAction {
    #[must_use]
    pub fn to_body(&self) -> Value {
        match self {
            Self::Extend { new_size } => json!({ "os-extend": { "new_size": new_size } }),
            Self::SetBootable(bootable) => {
                json!({ "os-set_bootable": { "bootable": bootable } })
            }
            Self::ResetStatus(status) => {
                json!({ "os-reset_status": { "status": status.as_str() } })
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VolumeSnapshot {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub volume_id: String,
    pub status: SnapshotStatus,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(rename = "os-extended-snapshot-attributes:progress", default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Envelope for VolumeSnapshot {
    const ROOT: &'static str = "snapshot";
}

impl Collection for VolumeSnapshot {
    const COLLECTION: &'static str = "snapshots";
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotCreate {
    pub volume_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

impl Envelope for SnapshotCreate {
    const ROOT: &'static str = "snapshot";
}

impl SnapshotCreate {
    pub fn new(volume_id: impl Into<String>) -> Self {
        Self {
            volume_id: volume_id.into(),
            name: None,
            description: None,
            force: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Snapshot an attached volume.
    #[must_use]
    pub fn forced(mut self) -> Self {
        self.force = Some(true);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub extra_specs: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "os-volume-type-access:is_public",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_public: Option<bool>,
}

impl Envelope for VolumeType {
    const ROOT: &'static str = "volume_type";
}

impl Collection for VolumeType {
    const COLLECTION: &'static str = "volume_types";
}

#[derive(Debug, Clone, Serialize)]
pub struct VolumeTypeCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_specs: Option<HashMap<String, String>>,
}

impl Envelope for VolumeTypeCreate {
    const ROOT: &'static str = "volume_type";
}
