// ── Interface domain type ──

use serde::{Deserialize, Serialize};

use super::common::ElementState;

/// A node interface. IP data is only present after a deep lab fetch,
/// which merges the lab's layer-3 report by MAC address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub id: String,
    pub node_id: String,
    pub lab_id: String,
    pub label: String,
    pub slot: Option<u32>,
    /// `physical` or `loopback`.
    pub kind: String,
    pub mac_address: Option<String>,
    pub is_connected: bool,
    pub ip4: Vec<String>,
    pub ip6: Vec<String>,
    pub state: ElementState,
}

impl Interface {
    /// The interface has been instantiated on a compute host.
    pub fn exists(&self) -> bool {
        self.state != ElementState::DefinedOnCore
    }

    pub fn runs(&self) -> bool {
        self.state == ElementState::Started
    }

    /// Case-insensitive MAC comparison.
    pub fn has_mac(&self, mac: &str) -> bool {
        self.mac_address
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(mac))
    }
}
