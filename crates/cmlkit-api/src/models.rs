//! Wire types for the controller's `/api/v0/` endpoints.
//!
//! Field names follow the controller's snake_case JSON. Every response
//! type tolerates missing fields via `#[serde(default)]` because the
//! controller adds and drops attributes between releases.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ── System ───────────────────────────────────────────────────────────

/// `GET system_information`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInformation {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub ready: bool,
}

/// Body of create endpoints that only echo the new id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

// ── Labs ─────────────────────────────────────────────────────────────

/// Lab metadata: from `GET labs/{id}`, `POST labs`, `PATCH labs/{id}`.
///
/// `owner` is the owning user's id; the deep fetch resolves it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabResponse {
    pub id: String,
    pub state: String,
    pub created: String,
    pub modified: String,
    #[serde(rename = "lab_title")]
    pub title: String,
    #[serde(rename = "lab_description")]
    pub description: String,
    #[serde(rename = "lab_notes")]
    pub notes: String,
    pub owner: String,
    pub node_count: u32,
    pub link_count: u32,
    pub groups: Vec<LabGroup>,
}

/// Group permission attached to a lab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabGroup {
    pub id: String,
    /// `read_only` or `read_write`.
    pub permission: String,
}

/// Body for `POST labs` / `PATCH labs/{id}`. The create/update endpoints
/// use the short names, unlike the `lab_*` names they return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabCreateUpdate {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

/// `POST import`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LabImportResponse {
    pub id: String,
    pub warnings: Vec<String>,
}

/// `GET populate_lab_tiles`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabTiles {
    pub lab_tiles: HashMap<String, LabResponse>,
}

// ── Nodes ────────────────────────────────────────────────────────────

/// One entry of a named (multi-file) node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedConfig {
    pub name: String,
    pub content: String,
}

/// The `configuration` attribute of a node.
///
/// The controller sends `null`, a single string, or (from 2.7.0) a list
/// of named files, all under the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeConfiguration {
    #[default]
    None,
    Single(String),
    Named(Vec<NamedConfig>),
}

impl NodeConfiguration {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl Serialize for NodeConfiguration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_none(),
            Self::Single(text) => serializer.serialize_str(text),
            Self::Named(configs) => configs.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for NodeConfiguration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ConfigVisitor;

        impl<'de> Visitor<'de> for ConfigVisitor {
            type Value = NodeConfiguration;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("null, a string, or a list of named configurations")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(NodeConfiguration::None)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(NodeConfiguration::None)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
                d.deserialize_any(self)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(NodeConfiguration::Single(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(NodeConfiguration::Single(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut configs = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(cfg) = seq.next_element::<NamedConfig>()? {
                    configs.push(cfg);
                }
                Ok(NodeConfiguration::Named(configs))
            }
        }

        deserializer.deserialize_any(ConfigVisitor)
    }
}

/// Serial console attached to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialDevice {
    pub console_key: String,
    pub device_number: u32,
}

/// Node: from `GET labs/{lab}/nodes/{id}`.
///
/// Resource fields are optional: the controller reports `null` for values
/// inherited from the node definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeResponse {
    pub id: String,
    pub lab_id: String,
    pub label: String,
    pub x: i32,
    pub y: i32,
    pub hide_links: bool,
    pub node_definition: String,
    pub image_definition: Option<String>,
    pub configuration: NodeConfiguration,
    pub cpus: Option<u32>,
    pub cpu_limit: Option<u32>,
    pub ram: Option<u32>,
    pub data_volume: Option<u32>,
    pub boot_disk_size: Option<u32>,
    pub tags: Vec<String>,
    pub state: String,
    pub vnc_key: Option<String>,
    pub serial_devices: Vec<SerialDevice>,
    pub compute_id: Option<String>,
}

/// Body for `POST labs/{lab}/nodes` and `PATCH labs/{lab}/nodes/{id}`.
///
/// `tags` is always sent: the controller rejects `null` there.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeCreateUpdate {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub x: i32,
    pub y: i32,
    pub hide_links: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_definition: Option<String>,
    #[serde(skip_serializing_if = "NodeConfiguration::is_none")]
    pub configuration: NodeConfiguration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_volume: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_disk_size: Option<u32>,
    pub tags: Vec<String>,
}

/// Body for configuration-only node updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeConfigUpdate {
    pub configuration: NodeConfiguration,
}

// ── Interfaces ───────────────────────────────────────────────────────

/// Interface: from `GET labs/{lab}/interfaces/{id}` or the per-node
/// list with `?data=true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceResponse {
    pub id: String,
    pub lab_id: String,
    /// Owning node id.
    pub node: String,
    pub label: String,
    pub slot: Option<u32>,
    /// `physical` or `loopback`.
    #[serde(rename = "type")]
    pub kind: String,
    pub mac_address: Option<String>,
    pub is_connected: bool,
    pub state: String,
}

/// Body for `POST labs/{lab}/interfaces`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceCreate {
    pub node: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<u32>,
}

/// `POST labs/{lab}/interfaces` returns one interface, or every interface
/// up to the requested slot when a slot was given.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InterfaceCreated {
    Many(Vec<InterfaceResponse>),
    One(InterfaceResponse),
}

// ── Layer 3 ──────────────────────────────────────────────────────────

/// `GET labs/{lab}/layer3_addresses`, keyed by node id.
pub type Layer3Addresses = HashMap<String, NodeLayer3>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NodeLayer3 {
    pub name: String,
    /// Keyed by MAC address.
    pub interfaces: HashMap<String, InterfaceLayer3>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InterfaceLayer3 {
    pub id: String,
    pub label: String,
    pub ip4: Option<Vec<String>>,
    pub ip6: Option<Vec<String>>,
}

// ── Links ────────────────────────────────────────────────────────────

/// Link: from `GET labs/{lab}/links/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkResponse {
    pub id: String,
    pub lab_id: String,
    pub label: String,
    pub interface_a: String,
    pub interface_b: String,
    pub node_a: String,
    pub node_b: String,
    pub link_capture_key: String,
    pub state: String,
}

/// Body for `POST labs/{lab}/links`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkCreate {
    pub src_int: String,
    pub dst_int: String,
}

// ── Users ────────────────────────────────────────────────────────────

/// User: from `GET users/{id}` and `GET users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserResponse {
    pub id: String,
    pub created: String,
    pub modified: String,
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub description: String,
    pub admin: bool,
    pub directory_dn: String,
    pub groups: Vec<String>,
    pub labs: Vec<String>,
    pub opt_in: bool,
    pub resource_pool: Option<String>,
}
