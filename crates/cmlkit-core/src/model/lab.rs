// ── Lab domain type ──

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize, Serializer};

use super::common::ElementState;
use super::link::Link;
use super::node::{Node, NodeMap};
use super::user::User;
use crate::error::CoreError;

/// Shared, mutable lab reference handed out by the controller. With
/// caching enabled every caller of the same lab id holds the same handle.
pub type LabHandle = Arc<RwLock<Lab>>;

/// Group permission attached to a lab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabGroup {
    pub id: String,
    pub permission: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    pub id: String,
    pub state: ElementState,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub title: String,
    pub description: String,
    pub notes: String,
    /// Only `id` is set unless the lab came from a deep fetch.
    pub owner: User,
    pub node_count: u32,
    pub link_count: u32,
    #[serde(serialize_with = "nodes_as_list", skip_deserializing)]
    pub nodes: NodeMap,
    pub links: Vec<Link>,
    pub groups: Vec<LabGroup>,
}

/// Nodes go out as a list ordered by id.
fn nodes_as_list<S: Serializer>(nodes: &NodeMap, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(nodes.values())
}

impl Lab {
    /// A lab to be created with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Wiping only makes sense once something was instantiated and
    /// nothing is running any more.
    pub fn can_be_wiped(&self) -> bool {
        if self.nodes.is_empty() {
            return self.state != ElementState::DefinedOnCore;
        }
        self.nodes
            .values()
            .all(|node| node.state == ElementState::DefinedOnCore)
    }

    /// At least one node is past `STOPPED`.
    pub fn running(&self) -> bool {
        self.nodes.values().any(|node| {
            !matches!(
                node.state,
                ElementState::DefinedOnCore | ElementState::Stopped
            )
        })
    }

    /// Every node has finished booting.
    pub fn booted(&self) -> bool {
        self.nodes
            .values()
            .all(|node| node.state == ElementState::Booted)
    }

    pub fn node_by_label(&self, label: &str) -> Result<&Node, CoreError> {
        self.nodes
            .values()
            .find(|node| node.label == label)
            .ok_or_else(|| CoreError::not_found("node", label))
    }
}
