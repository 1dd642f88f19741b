// ── Node domain type ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use cmlkit_api::models::{NamedConfig, NodeConfiguration, SerialDevice};

use super::common::ElementState;
use super::interface::Interface;

/// Nodes of a lab keyed by node id. Ordered, so serialization and
/// iteration are stable.
pub type NodeMap = BTreeMap<String, Node>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
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
    pub state: ElementState,
    pub vnc_key: Option<String>,
    pub serial_devices: Vec<SerialDevice>,
    pub compute_id: Option<String>,
    /// Filled by the deep fetch and by `interfaces_for_node`.
    pub interfaces: Vec<Interface>,
}

impl Node {
    /// A node to be created in `lab_id`.
    pub fn new(
        lab_id: impl Into<String>,
        label: impl Into<String>,
        node_definition: impl Into<String>,
    ) -> Self {
        Self {
            lab_id: lab_id.into(),
            label: label.into(),
            node_definition: node_definition.into(),
            ..Self::default()
        }
    }

    /// Compare configurations. A missing single configuration on either
    /// side matches anything; named configurations must match pairwise.
    pub fn same_config(&self, other: &Node) -> bool {
        match (&self.configuration, &other.configuration) {
            (NodeConfiguration::Single(a), NodeConfiguration::Single(b)) => a == b,
            (NodeConfiguration::Named(a), NodeConfiguration::Named(b)) => a == b,
            (NodeConfiguration::Named(named), _) | (_, NodeConfiguration::Named(named)) => {
                named.is_empty()
            }
            _ => true,
        }
    }

    /// Interface by id.
    pub fn interface(&self, id: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_config(configuration: NodeConfiguration) -> Node {
        Node {
            configuration,
            ..Node::default()
        }
    }

    fn named(pairs: &[(&str, &str)]) -> NodeConfiguration {
        NodeConfiguration::Named(
            pairs
                .iter()
                .map(|(name, content)| NamedConfig {
                    name: (*name).into(),
                    content: (*content).into(),
                })
                .collect(),
        )
    }

    #[test]
    fn single_configs_compare_by_text() {
        let a = with_config(NodeConfiguration::Single("hostname a".into()));
        let b = with_config(NodeConfiguration::Single("hostname b".into()));
        assert!(a.same_config(&a.clone()));
        assert!(!a.same_config(&b));
    }

    #[test]
    fn missing_single_config_matches() {
        let a = with_config(NodeConfiguration::Single("hostname a".into()));
        let none = with_config(NodeConfiguration::None);
        assert!(a.same_config(&none));
        assert!(none.same_config(&a));
    }

    #[test]
    fn named_configs_compare_pairwise() {
        let a = with_config(named(&[("a.txt", "1"), ("b.txt", "2")]));
        let same = with_config(named(&[("a.txt", "1"), ("b.txt", "2")]));
        let reordered = with_config(named(&[("b.txt", "2"), ("a.txt", "1")]));
        let shorter = with_config(named(&[("a.txt", "1")]));
        assert!(a.same_config(&same));
        assert!(!a.same_config(&reordered));
        assert!(!a.same_config(&shorter));
        assert!(!a.same_config(&with_config(NodeConfiguration::None)));
    }
}
