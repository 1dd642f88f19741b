// ── API-to-domain type conversions ──
//
// Bridges raw `cmlkit_api::models` wire types into canonical
// `cmlkit_core::model` domain types and back into request bodies. Link
// endpoints are resolved against an already-fetched node map.

use chrono::{DateTime, Utc};

use cmlkit_api::models::{
    InterfaceResponse, LabCreateUpdate, LabGroup as WireLabGroup, LabResponse, LinkResponse,
    NodeCreateUpdate, NodeResponse, UserResponse,
};

use crate::error::CoreError;
use crate::model::{
    ElementState, Interface, InterfaceRef, Lab, LabGroup, Link, Node, NodeConfiguration, NodeMap,
    User,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp, dropping empty or malformed values.
fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ── Labs ───────────────────────────────────────────────────────────

impl From<WireLabGroup> for LabGroup {
    fn from(g: WireLabGroup) -> Self {
        Self {
            id: g.id,
            permission: g.permission,
        }
    }
}

impl From<LabResponse> for Lab {
    fn from(l: LabResponse) -> Self {
        Self {
            state: ElementState::from(l.state),
            created: parse_datetime(&l.created),
            modified: parse_datetime(&l.modified),
            title: l.title,
            description: l.description,
            notes: l.notes,
            owner: User::with_id(l.owner),
            node_count: l.node_count,
            link_count: l.link_count,
            nodes: NodeMap::new(),
            links: Vec::new(),
            groups: l.groups.into_iter().map(LabGroup::from).collect(),
            id: l.id,
        }
    }
}

/// Body for lab create/update. Only title, description, and notes are
/// writable.
pub(crate) fn lab_request(lab: &Lab) -> LabCreateUpdate {
    LabCreateUpdate {
        title: lab.title.clone(),
        description: lab.description.clone(),
        notes: lab.notes.clone(),
    }
}

// ── Users ──────────────────────────────────────────────────────────

impl From<UserResponse> for User {
    fn from(u: UserResponse) -> Self {
        Self {
            created: parse_datetime(&u.created),
            id: u.id,
            username: u.username,
            fullname: u.fullname,
            email: u.email,
            description: u.description,
            is_admin: u.admin,
            groups: u.groups,
            labs: u.labs,
        }
    }
}

// ── Nodes ──────────────────────────────────────────────────────────

impl From<NodeResponse> for Node {
    fn from(n: NodeResponse) -> Self {
        Self {
            id: n.id,
            lab_id: n.lab_id,
            label: n.label,
            x: n.x,
            y: n.y,
            hide_links: n.hide_links,
            node_definition: n.node_definition,
            image_definition: n.image_definition,
            configuration: n.configuration,
            cpus: n.cpus,
            cpu_limit: n.cpu_limit,
            ram: n.ram,
            data_volume: n.data_volume,
            boot_disk_size: n.boot_disk_size,
            tags: n.tags,
            state: ElementState::from(n.state),
            vnc_key: n.vnc_key,
            serial_devices: n.serial_devices,
            compute_id: n.compute_id,
            interfaces: Vec::new(),
        }
    }
}

/// Body for node create (`update == false`) or update.
///
/// Resources, image, and configuration can only change while the node
/// has no VM (`DEFINED_ON_CORE`). The node definition is fixed after
/// creation.
pub(crate) fn node_request(node: &Node, update: bool) -> NodeCreateUpdate {
    let mut body = NodeCreateUpdate {
        label: node.label.clone(),
        x: node.x,
        y: node.y,
        hide_links: node.hide_links,
        tags: node.tags.clone(),
        ..NodeCreateUpdate::default()
    };

    if node.state == ElementState::DefinedOnCore {
        body.configuration = node.configuration.clone();
        body.cpus = node.cpus;
        body.cpu_limit = node.cpu_limit;
        body.ram = node.ram;
        body.data_volume = node.data_volume;
        body.boot_disk_size = node.boot_disk_size;
        body.image_definition = node.image_definition.clone().filter(|s| !s.is_empty());
    }
    if !update && !node.node_definition.is_empty() {
        body.node_definition = Some(node.node_definition.clone());
    }
    body
}

// ── Interfaces ─────────────────────────────────────────────────────

impl From<InterfaceResponse> for Interface {
    fn from(i: InterfaceResponse) -> Self {
        Self {
            id: i.id,
            node_id: i.node,
            lab_id: i.lab_id,
            label: i.label,
            slot: i.slot,
            kind: i.kind,
            mac_address: i.mac_address,
            is_connected: i.is_connected,
            ip4: Vec::new(),
            ip6: Vec::new(),
            state: ElementState::from(i.state),
        }
    }
}

// ── Links ──────────────────────────────────────────────────────────

fn resolve_endpoint(
    nodes: &NodeMap,
    node_id: &str,
    interface_id: &str,
) -> Result<InterfaceRef, CoreError> {
    let node = nodes
        .get(node_id)
        .ok_or_else(|| CoreError::not_found("node", node_id))?;
    let iface = node
        .interface(interface_id)
        .ok_or_else(|| CoreError::not_found("interface", interface_id))?;
    Ok(InterfaceRef {
        node_id: node.id.clone(),
        interface_id: iface.id.clone(),
        node_label: node.label.clone(),
        interface_label: iface.label.clone(),
    })
}

/// Attach both ends of a link to the nodes and interfaces in `nodes`.
pub(crate) fn resolve_link(link: LinkResponse, nodes: &NodeMap) -> Result<Link, CoreError> {
    let endpoint_a = resolve_endpoint(nodes, &link.node_a, &link.interface_a)?;
    let endpoint_b = resolve_endpoint(nodes, &link.node_b, &link.interface_b)?;
    Ok(Link {
        id: link.id,
        lab_id: link.lab_id,
        label: link.label,
        endpoint_a,
        endpoint_b,
        capture_key: link.link_capture_key,
        state: ElementState::from(link.state),
    })
}

/// Link with endpoints carrying ids only, for shallow link reads.
pub(crate) fn unresolved_link(link: LinkResponse) -> Link {
    Link {
        endpoint_a: InterfaceRef {
            node_id: link.node_a,
            interface_id: link.interface_a,
            ..InterfaceRef::default()
        },
        endpoint_b: InterfaceRef {
            node_id: link.node_b,
            interface_id: link.interface_b,
            ..InterfaceRef::default()
        },
        id: link.id,
        lab_id: link.lab_id,
        label: link.label,
        capture_key: link.link_capture_key,
        state: ElementState::from(link.state),
    }
}

/// True when the request would send a named configuration.
pub(crate) fn uses_named_configs(configuration: &NodeConfiguration) -> bool {
    matches!(configuration, NodeConfiguration::Named(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node_with_iface(id: &str, label: &str, iface: &str) -> Node {
        Node {
            id: id.into(),
            label: label.into(),
            interfaces: vec![Interface {
                id: iface.into(),
                node_id: id.into(),
                label: "eth0".into(),
                ..Interface::default()
            }],
            ..Node::default()
        }
    }

    fn link(node_b: &str) -> LinkResponse {
        LinkResponse {
            id: "link1".into(),
            lab_id: "lab1".into(),
            interface_a: "n1i1".into(),
            interface_b: "n2i1".into(),
            node_a: "node1".into(),
            node_b: node_b.into(),
            state: "DEFINED_ON_CORE".into(),
            ..LinkResponse::default()
        }
    }

    fn nodes() -> NodeMap {
        [
            node_with_iface("node1", "alpine-0", "n1i1"),
            node_with_iface("node2", "alpine-1", "n2i1"),
        ]
        .into_iter()
        .map(|n| (n.id.clone(), n))
        .collect()
    }

    #[test]
    fn link_endpoints_resolve_labels() {
        let resolved = resolve_link(link("node2"), &nodes()).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            resolved.endpoint_b,
            InterfaceRef {
                node_id: "node2".into(),
                interface_id: "n2i1".into(),
                node_label: "alpine-1".into(),
                interface_label: "eth0".into(),
            }
        );
        assert_eq!(resolved.state, ElementState::DefinedOnCore);
    }

    #[test]
    fn missing_endpoint_is_not_found() {
        let err = resolve_link(link("node9"), &nodes()).err();
        assert!(matches!(err, Some(CoreError::ElementNotFound { ref kind, ref identifier })
            if kind == "node" && identifier == "node9"));
    }

    #[test]
    fn update_request_drops_node_definition() {
        let mut node = Node::new("lab1", "r1", "iosv");
        node.ram = Some(512);
        node.configuration = NodeConfiguration::Single("hostname r1".into());

        let create = node_request(&node, false);
        assert_eq!(create.node_definition.as_deref(), Some("iosv"));
        assert_eq!(create.ram, Some(512));

        let update = node_request(&node, true);
        assert_eq!(update.node_definition, None);
        assert_eq!(update.configuration, node.configuration);
    }

    #[test]
    fn running_node_only_sends_layout() {
        let mut node = Node::new("lab1", "r1", "iosv");
        node.state = ElementState::Booted;
        node.ram = Some(512);
        node.x = 100;

        let update = node_request(&node, true);
        assert_eq!(update.ram, None);
        assert!(update.configuration.is_none());
        assert_eq!(update.x, 100);
    }

    #[test]
    fn lab_conversion_keeps_owner_id() {
        let lab = Lab::from(LabResponse {
            id: "lab1".into(),
            owner: "u1".into(),
            state: "STARTED".into(),
            created: "2022-05-11T20:36:15+00:00".into(),
            ..LabResponse::default()
        });
        assert_eq!(lab.owner, User::with_id("u1"));
        assert_eq!(lab.state, ElementState::Started);
        assert!(lab.created.is_some());
        assert!(lab.modified.is_none());
    }
}
