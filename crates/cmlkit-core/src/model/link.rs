// ── Link domain type ──

use serde::{Deserialize, Serialize};

use super::common::ElementState;

/// One end of a link, resolved against the lab's node map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRef {
    pub node_id: String,
    pub interface_id: String,
    pub node_label: String,
    pub interface_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub lab_id: String,
    pub label: String,
    pub endpoint_a: InterfaceRef,
    pub endpoint_b: InterfaceRef,
    pub capture_key: String,
    pub state: ElementState,
}

impl Link {
    /// Whether either end sits on `node_id`.
    pub fn touches(&self, node_id: &str) -> bool {
        self.endpoint_a.node_id == node_id || self.endpoint_b.node_id == node_id
    }
}
