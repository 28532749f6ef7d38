//! Bare metal (v1) chassis, nodes, ports and drivers.
//!
//! Single resources are returned bare; listings use the plural key.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::compute::Link;
use crate::marshal::{Collection, Envelope};
use crate::status::{PowerState, ProvisionState};

/// Request header selecting the bare metal API microversion.
pub const API_VERSION_HEADER: &str = "X-OpenStack-Ironic-API-Version";

#[derive(Debug, Clone, Deserialize)]
pub struct Chassis {
    pub uuid: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extra: HashMap<String, Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Envelope for Chassis {
    const ROOT: &'static str = "chassis";
    const JSON_WRAPPED: bool = false;
}

impl Collection for Chassis {
    const COLLECTION: &'static str = "chassis";
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChassisCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, Value>,
}

impl Envelope for ChassisCreate {
    const ROOT: &'static str = "chassis";
    const JSON_WRAPPED: bool = false;
}

impl ChassisCreate {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            extra: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub chassis_uuid: Option<String>,
    #[serde(default)]
    pub instance_uuid: Option<String>,
    #[serde(default)]
    pub provision_state: Option<ProvisionState>,
    #[serde(default)]
    pub target_provision_state: Option<ProvisionState>,
    #[serde(default)]
    pub power_state: Option<PowerState>,
    #[serde(default)]
    pub target_power_state: Option<PowerState>,
    #[serde(default)]
    pub maintenance: bool,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub driver_info: HashMap<String, Value>,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
    #[serde(default)]
    pub extra: HashMap<String, Value>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Envelope for Node {
    const ROOT: &'static str = "node";
    const JSON_WRAPPED: bool = false;
}

impl Collection for Node {
    const COLLECTION: &'static str = "nodes";
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeCreate {
    pub driver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis_uuid: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub driver_info: HashMap<String, Value>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, Value>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, Value>,
}

impl Envelope for NodeCreate {
    const ROOT: &'static str = "node";
    const JSON_WRAPPED: bool = false;
}

impl NodeCreate {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn in_chassis(mut self, chassis_uuid: impl Into<String>) -> Self {
        self.chassis_uuid = Some(chassis_uuid.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub name: String,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(rename = "type", default)]
    pub driver_type: Option<String>,
}

impl Envelope for Driver {
    const ROOT: &'static str = "driver";
    const JSON_WRAPPED: bool = false;
}

impl Collection for Driver {
    const COLLECTION: &'static str = "drivers";
}

#[derive(Debug, Clone, Deserialize)]
pub struct BareMetalPort {
    pub uuid: String,
    pub address: String,
    #[serde(default)]
    pub node_uuid: Option<String>,
    #[serde(default)]
    pub extra: HashMap<String, Value>,
}

impl Envelope for BareMetalPort {
    const ROOT: &'static str = "port";
    const JSON_WRAPPED: bool = false;
}

impl Collection for BareMetalPort {
    const COLLECTION: &'static str = "ports";
}

#[derive(Debug, Clone, Serialize)]
pub struct BareMetalPortCreate {
    pub node_uuid: String,
    pub address: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, Value>,
}

impl Envelope for BareMetalPortCreate {
    const ROOT: &'static str = "port";
    const JSON_WRAPPED: bool = false;
}

impl BareMetalPortCreate {
    pub fn new(node_uuid: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            node_uuid: node_uuid.into(),
            address: address.into(),
            extra: HashMap::new(),
        }
    }
}

/// Target of `PUT /v1/nodes/{id}/states/provision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionTarget {
    Manage,
    Provide,
    Inspect,
    Active,
    Rebuild,
    Deleted,
    Abort,
}

impl ProvisionTarget {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manage => "manage",
            Self::Provide => "provide",
            Self::Inspect => "inspect",
            Self::Active => "active",
            Self::Rebuild => "rebuild",
            Self::Deleted => "deleted",
            Self::Abort => "abort",
        }
    }

    #[must_use]
    pub fn to_body(self) -> Value {
        json!({ "target": self.as_str() })
    }

    /// Stable state the node settles in once the transition succeeds.
    #[must_use]
    pub fn settled_state(self) -> ProvisionState {
        match self {
            Self::Manage | Self::Inspect => ProvisionState::Manageable,
            Self::Provide | Self::Deleted | Self::Abort => ProvisionState::Available,
            Self::Active | Self::Rebuild => ProvisionState::Active,
        }
    }
}

/// Target of `PUT /v1/nodes/{id}/states/power`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerTarget {
    On,
    Off,
    Reboot,
}

impl PowerTarget {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "power on",
            Self::Off => "power off",
            Self::Reboot => "rebooting",
        }
    }

    #[must_use]
    pub fn to_body(self) -> Value {
        json!({ "target": self.as_str() })
    }

    #[must_use]
    pub fn settled_state(self) -> PowerState {
        match self {
            Self::On | Self::Reboot => PowerState::PowerOn,
            Self::Off => PowerState::PowerOff,
        }
    }
}
