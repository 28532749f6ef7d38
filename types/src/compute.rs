//! Compute (v2) servers, flavors, images and key pairs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::marshal::{Collection, Envelope};
use crate::secret::Secret;
use crate::serde_helpers::{empty_string_as_none, number_or_empty};
use crate::status::ServerStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default)]
    pub rel: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub addr: String,
    #[serde(default)]
    pub version: u8,
    #[serde(rename = "OS-EXT-IPS:type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: ServerStatus,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub image: Option<ResourceRef>,
    #[serde(default)]
    pub flavor: Option<ResourceRef>,
    #[serde(default)]
    pub addresses: HashMap<String, Vec<Address>>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(rename = "hostId", default)]
    pub host_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(rename = "accessIPv4", default)]
    pub access_ipv4: Option<String>,
    #[serde(rename = "accessIPv6", default)]
    pub access_ipv6: Option<String>,
    #[serde(default)]
    pub key_name: Option<String>,
    #[serde(rename = "OS-EXT-STS:task_state", default)]
    pub task_state: Option<String>,
    #[serde(rename = "OS-EXT-STS:vm_state", default)]
    pub vm_state: Option<String>,
    #[serde(rename = "OS-EXT-STS:power_state", default)]
    pub power_state: Option<u8>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Envelope for Server {
    const ROOT: &'static str = "server";
}

impl Collection for Server {
    const COLLECTION: &'static str = "servers";
}

impl Server {
    /// Every address on every network, in network-name order.
    #[must_use]
    pub fn all_addresses(&self) -> Vec<&Address> {
        let mut networks: Vec<_> = self.addresses.iter().collect();
        networks.sort_by(|a, b| a.0.cmp(b.0));
        networks
            .into_iter()
            .flat_map(|(_, addresses)| addresses.iter())
            .collect()
    }
}

/// Server summary as returned by `GET /servers` (no details).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Envelope for ServerSummary {
    const ROOT: &'static str = "server";
}

impl Collection for ServerSummary {
    const COLLECTION: &'static str = "servers";
}

/// Response of `POST /servers`; the full record arrives later via `GET`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedServer {
    pub id: String,
    #[serde(rename = "adminPass", default)]
    pub admin_pass: Option<Secret>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Envelope for CreatedServer {
    const ROOT: &'static str = "server";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkRef {
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerCreate {
    pub name: String,
    #[serde(rename = "imageRef", skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(rename = "flavorRef")]
    pub flavor_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networks: Option<Vec<NetworkRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_drive: Option<bool>,
    #[serde(rename = "adminPass", skip_serializing_if = "Option::is_none")]
    pub admin_pass: Option<Secret>,
}

impl Envelope for ServerCreate {
    const ROOT: &'static str = "server";
}

impl ServerCreate {
    pub fn new(
        name: impl Into<String>,
        image_ref: impl Into<String>,
        flavor_ref: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            image_ref: Some(image_ref.into()),
            flavor_ref: flavor_ref.into(),
            metadata: None,
            key_name: None,
            networks: None,
            availability_zone: None,
            user_data: None,
            config_drive: None,
            admin_pass: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = Some(key_name.into());
        self
    }

    #[must_use]
    pub fn with_network(mut self, uuid: impl Into<String>) -> Self {
        self.networks.get_or_insert_with(Vec::new).push(NetworkRef {
            uuid: uuid.into(),
            fixed_ip: None,
            port: None,
        });
        self
    }

    #[must_use]
    pub fn with_availability_zone(mut self, zone: impl Into<String>) -> Self {
        self.availability_zone = Some(zone.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "accessIPv4", skip_serializing_if = "Option::is_none")]
    pub access_ipv4: Option<String>,
    #[serde(rename = "accessIPv6", skip_serializing_if = "Option::is_none")]
    pub access_ipv6: Option<String>,
}

impl Envelope for ServerUpdate {
    const ROOT: &'static str = "server";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootType {
    Soft,
    Hard,
}

impl RebootType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Soft => "SOFT",
            Self::Hard => "HARD",
        }
    }
}

/// `POST /servers/{id}/action` bodies.
#[derive(Debug, Clone)]
pub enum ServerAction {
    Reboot(RebootType),
    Resize {
        flavor_ref: String,
    },
    ConfirmResize,
    RevertResize,
    Rebuild {
        image_ref: String,
        name: Option<String>,
        admin_pass: Option<Secret>,
    },
    ChangePassword(Secret),
    CreateImage {
        name: String,
        metadata: HashMap<String, String>,
    },
}

impl ServerAction {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Reboot(_) => "reboot",
            Self::Resize { .. } => "resize",
            Self::ConfirmResize => "confirmResize",
            Self::RevertResize => "revertResize",
            Self::Rebuild { .. } => "rebuild",
            Self::ChangePassword(_) => "changePassword",
            Self::CreateImage { .. } => "createImage",
        }
    }

    #[must_use]
    pub fn to_body(&self) -> Value {
        let args = match self {
            Self::Reboot(kind) => json!({ "type": kind.as_str() }),
            Self::Resize { flavor_ref } => json!({ "flavorRef": flavor_ref }),
            Self::ConfirmResize | Self::RevertResize => Value::Null,
            Self::Rebuild {
                image_ref,
                name,
                admin_pass,
            } => {
                let mut args = Map::new();
                args.insert("imageRef".to_string(), json!(image_ref));
                if let Some(name) = name {
                    args.insert("name".to_string(), json!(name));
                }
                if let Some(pass) = admin_pass {
                    args.insert("adminPass".to_string(), json!(pass.expose_secret()));
                }
                Value::Object(args)
            }
            Self::ChangePassword(pass) => json!({ "adminPass": pass.expose_secret() }),
            Self::CreateImage { name, metadata } => {
                json!({ "name": name, "metadata": metadata })
            }
        };
        let mut body = Map::new();
        body.insert(self.name().to_string(), args);
        Value::Object(body)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    pub ram: u64,
    pub vcpus: u32,
    pub disk: u64,
    #[serde(rename = "OS-FLV-EXT-DATA:ephemeral", default)]
    pub ephemeral: Option<u64>,
    #[serde(default, deserialize_with = "number_or_empty")]
    pub swap: u64,
    #[serde(default)]
    pub rxtx_factor: Option<f64>,
    #[serde(rename = "os-flavor-access:is_public", default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Envelope for Flavor {
    const ROOT: &'static str = "flavor";
}

impl Collection for Flavor {
    const COLLECTION: &'static str = "flavors";
}

/// Image as proxied by the compute API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeImage {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(rename = "minDisk", default)]
    pub min_disk: u64,
    #[serde(rename = "minRam", default)]
    pub min_ram: u64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Envelope for ComputeImage {
    const ROOT: &'static str = "image";
}

impl Collection for ComputeImage {
    const COLLECTION: &'static str = "images";
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyPair {
    pub name: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub private_key: Option<Secret>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Envelope for KeyPair {
    const ROOT: &'static str = "keypair";
}

/// Key pair listings nest each entry in its own `keypair` object.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyPairEntry {
    pub keypair: KeyPair,
}

impl Envelope for KeyPairEntry {
    const ROOT: &'static str = "keypair";
}

impl Collection for KeyPairEntry {
    const COLLECTION: &'static str = "keypairs";
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyPairCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

impl Envelope for KeyPairCreate {
    const ROOT: &'static str = "keypair";
}
