// Integration tests for deep lab fetches, the lab cache, and the node /
// interface operations of `Controller`, against a wiremock controller.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cmlkit_core::{
    AuthCredentials, Controller, ControllerConfig, CoreError, ElementState, Lab, NamedConfig, Node,
};

const OWNER: &str = "00000000-0000-4000-a000-000000000000";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(version: &str, use_cache: bool) -> (MockServer, Controller) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v0/system_information"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "version": version, "ready": true })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v0/authok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut config = ControllerConfig::new(
        Url::parse(&server.uri()).unwrap(),
        AuthCredentials::Token(SecretString::from("secret")),
    );
    config.use_cache = use_cache;
    let controller = Controller::new(config).unwrap();
    (server, controller)
}

async fn mount_json(server: &MockServer, verb: &str, route: &str, body: Value) {
    Mock::given(method(verb))
        .and(path(format!("/api/v0/{route}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn lab_body(title: &str) -> Value {
    json!({
        "id": "lab1",
        "state": "STARTED",
        "created": "2022-05-11T20:36:15+00:00",
        "modified": "2022-05-11T21:18:49+00:00",
        "lab_title": title,
        "lab_description": "",
        "lab_notes": "",
        "owner": OWNER,
        "node_count": 2,
        "link_count": 1,
        "groups": []
    })
}

fn node_body(id: &str, label: &str) -> Value {
    json!({
        "id": id,
        "lab_id": "lab1",
        "label": label,
        "x": 0,
        "y": 0,
        "node_definition": "alpine",
        "image_definition": null,
        "configuration": format!("hostname {label}"),
        "cpus": null,
        "cpu_limit": null,
        "ram": null,
        "data_volume": null,
        "boot_disk_size": null,
        "tags": [],
        "state": "BOOTED"
    })
}

fn iface_body(id: &str, node: &str, mac: &str) -> Value {
    json!({
        "id": id,
        "lab_id": "lab1",
        "node": node,
        "label": "eth0",
        "slot": 0,
        "type": "physical",
        "mac_address": mac,
        "is_connected": true,
        "state": "STARTED"
    })
}

fn link_body() -> Value {
    json!({
        "id": "link1",
        "interface_a": "n1i1",
        "interface_b": "n2i1",
        "lab_id": "lab1",
        "label": "alpine-0-eth0<->alpine-1-eth0",
        "link_capture_key": "",
        "node_a": "node1",
        "node_b": "node2",
        "state": "STARTED"
    })
}

/// Everything a deep fetch of `lab1` needs except the lab itself and
/// `node2`, which individual tests shape.
async fn mount_topology(server: &MockServer) {
    mount_json(
        server,
        "GET",
        &format!("users/{OWNER}"),
        json!({ "id": OWNER, "username": "admin", "admin": true }),
    )
    .await;
    mount_json(server, "GET", "labs/lab1/nodes", json!(["node1", "node2"])).await;
    mount_json(server, "GET", "labs/lab1/nodes/node1", node_body("node1", "alpine-0")).await;
    mount_json(
        server,
        "GET",
        "labs/lab1/nodes/node1/interfaces",
        json!([iface_body("n1i1", "node1", "52:54:00:0c:e0:69")]),
    )
    .await;
    mount_json(
        server,
        "GET",
        "labs/lab1/nodes/node2/interfaces",
        json!([iface_body("n2i1", "node2", "52:54:00:0c:e0:70")]),
    )
    .await;
    mount_json(
        server,
        "GET",
        "labs/lab1/layer3_addresses",
        json!({
            "node1": {
                "name": "alpine-0",
                "interfaces": {
                    "52:54:00:0C:E0:69": {
                        "id": "n1i1",
                        "label": "eth0",
                        "ip4": ["192.168.122.173"],
                        "ip6": ["fe80::5054:ff:fe0c:be77"]
                    }
                }
            },
            "node2": {
                "name": "alpine-1",
                "interfaces": {
                    "52:54:00:0c:e0:70": {
                        "id": "n2i1",
                        "label": "eth0",
                        "ip4": ["192.168.122.174"],
                        "ip6": ["fe80::5054:ff:fe0c:be88"]
                    }
                }
            }
        }),
    )
    .await;
    mount_json(server, "GET", "labs/lab1/links", json!(["link1"])).await;
    mount_json(server, "GET", "labs/lab1/links/link1", link_body()).await;
}

async fn mount_demo_lab(server: &MockServer) {
    mount_json(server, "GET", "labs/lab1", lab_body("vlandrop")).await;
    mount_topology(server).await;
    mount_json(server, "GET", "labs/lab1/nodes/node2", node_body("node2", "alpine-1")).await;
}

// ── Deep fetch ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_deep_fetch_builds_full_graph() {
    let (server, controller) = setup("2.7.0", false).await;
    mount_demo_lab(&server).await;

    let handle = controller.lab_get("lab1", true).await.unwrap();
    let lab = handle.read();

    assert_eq!(lab.title, "vlandrop");
    assert_eq!(lab.state, ElementState::Started);
    assert_eq!(lab.owner.username, "admin");
    assert!(lab.owner.is_admin);
    assert_eq!(lab.nodes.len(), 2);

    let n1 = lab.node_by_label("alpine-0").unwrap();
    assert_eq!(n1.interfaces.len(), 1);
    assert_eq!(n1.interfaces[0].ip4, ["192.168.122.173"]);
    assert_eq!(n1.interfaces[0].ip6, ["fe80::5054:ff:fe0c:be77"]);

    let n2 = lab.node_by_label("alpine-1").unwrap();
    assert_eq!(n2.interfaces[0].ip4, ["192.168.122.174"]);

    assert_eq!(lab.links.len(), 1);
    let link = &lab.links[0];
    assert_eq!(link.endpoint_a.node_label, "alpine-0");
    assert_eq!(link.endpoint_b.node_label, "alpine-1");
    assert_eq!(link.endpoint_b.interface_label, "eth0");
}

#[tokio::test]
async fn test_layer3_and_links_wait_for_slow_topology() {
    let (server, controller) = setup("2.7.0", false).await;
    mount_json(&server, "GET", "labs/lab1", lab_body("vlandrop")).await;
    mount_topology(&server).await;

    // The layer-3 report and the links arrive long before node2 does.
    Mock::given(method("GET"))
        .and(path("/api/v0/labs/lab1/nodes/node2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(node_body("node2", "alpine-1"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let handle = controller.lab_get("lab1", true).await.unwrap();
    let lab = handle.read();
    let n2 = lab.node_by_label("alpine-1").unwrap();
    assert_eq!(n2.interfaces[0].ip4, ["192.168.122.174"]);
    assert_eq!(lab.links[0].endpoint_b.node_id, "node2");
}

#[tokio::test]
async fn test_failed_subfetch_is_not_masked_by_cancellation() {
    let (server, controller) = setup("2.7.0", true).await;
    mount_json(&server, "GET", "labs/lab1", lab_body("vlandrop")).await;
    mount_topology(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v0/labs/lab1/nodes/node2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("node exploded"))
        .mount(&server)
        .await;

    let err = controller.lab_get("lab1", true).await.unwrap_err();
    assert!(
        matches!(err, CoreError::Api { status: 500, ref message } if message == "node exploded"),
        "got: {err:?}"
    );
    // Nothing half-built lands in the cache.
    assert!(controller.cache().is_empty());
}

#[tokio::test]
async fn test_dangling_link_endpoint_fails_the_fetch() {
    let (server, controller) = setup("2.7.0", false).await;
    mount_json(&server, "GET", "labs/lab1", lab_body("vlandrop")).await;
    mount_topology(&server).await;
    mount_json(&server, "GET", "labs/lab1/nodes/node2", node_body("node2", "alpine-1")).await;

    // Higher priority than the link mounted by `mount_topology`.
    Mock::given(method("GET"))
        .and(path("/api/v0/labs/lab1/links/link1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "link1",
            "interface_a": "n1i1",
            "interface_b": "n9i9",
            "node_a": "node1",
            "node_b": "node9",
            "state": "STARTED"
        })))
        .with_priority(1)
        .mount(&server)
        .await;

    let err = controller.lab_get("lab1", true).await.unwrap_err();
    assert!(
        matches!(err, CoreError::ElementNotFound { ref kind, ref identifier }
            if kind == "node" && identifier == "node9"),
        "got: {err:?}"
    );
}

// ── Cache ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_repeated_deep_fetch_refreshes_cached_lab_in_place() {
    let (server, controller) = setup("2.7.0", true).await;
    mount_topology(&server).await;
    mount_json(&server, "GET", "labs/lab1/nodes/node2", node_body("node2", "alpine-1")).await;

    Mock::given(method("GET"))
        .and(path("/api/v0/labs/lab1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lab_body("first")))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_json(&server, "GET", "labs/lab1", lab_body("second")).await;

    let first = controller.lab_get("lab1", true).await.unwrap();
    assert_eq!(first.read().title, "first");

    let second = controller.lab_get("lab1", true).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.read().title, "second");
    assert_eq!(first.read().nodes.len(), 2);
    assert_eq!(first.read().links.len(), 1);

    // Shallow reads are served from the cache.
    let shallow = controller.lab_get("lab1", false).await.unwrap();
    assert!(Arc::ptr_eq(&first, &shallow));
}

#[tokio::test]
async fn test_deep_fetch_after_shallow_read_fills_links() {
    let (server, controller) = setup("2.7.0", true).await;
    mount_demo_lab(&server).await;

    let shallow = controller.lab_get("lab1", false).await.unwrap();
    assert!(shallow.read().links.is_empty());
    assert_eq!(shallow.read().owner.username, "");

    let deep = controller.lab_get("lab1", true).await.unwrap();
    assert!(Arc::ptr_eq(&shallow, &deep));

    let lab = deep.read();
    assert_eq!(lab.nodes.len(), 2);
    assert_eq!(lab.links.len(), 1);
    assert_eq!(lab.links[0].endpoint_a.node_label, "alpine-0");
    assert_eq!(lab.owner.username, "admin");
}

#[tokio::test]
async fn test_deep_fetch_after_create_fills_links() {
    let (server, controller) = setup("2.7.0", true).await;
    mount_demo_lab(&server).await;
    mount_json(&server, "POST", "labs", lab_body("vlandrop")).await;

    let created = controller.lab_create(&Lab::new("vlandrop")).await.unwrap();
    assert!(created.read().links.is_empty());

    let deep = controller.lab_get("lab1", true).await.unwrap();
    assert!(Arc::ptr_eq(&created, &deep));
    assert_eq!(deep.read().nodes.len(), 2);
    assert_eq!(deep.read().links.len(), 1);
}

#[tokio::test]
async fn test_destroy_evicts_only_on_success() {
    let (server, controller) = setup("2.7.0", true).await;
    mount_json(&server, "GET", "labs/lab1", lab_body("vlandrop")).await;

    Mock::given(method("DELETE"))
        .and(path("/api/v0/labs/lab1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("busy"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v0/labs/lab1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    controller.lab_get("lab1", false).await.unwrap();
    assert_eq!(controller.cache().len(), 1);

    let err = controller.lab_destroy("lab1").await.unwrap_err();
    assert!(matches!(err, CoreError::Api { status: 500, .. }));
    assert_eq!(controller.cache().len(), 1);

    controller.lab_destroy("lab1").await.unwrap();
    assert!(controller.cache().is_empty());
}

#[tokio::test]
async fn test_lab_by_title() {
    let (server, controller) = setup("2.7.0", false).await;
    mount_json(
        &server,
        "GET",
        "populate_lab_tiles",
        json!({ "lab_tiles": { "lab1": lab_body("vlandrop") } }),
    )
    .await;

    let lab = controller.lab_get_by_title("vlandrop", false).await.unwrap();
    assert_eq!(lab.read().id, "lab1");
    assert_eq!(lab.read().owner.id, OWNER);

    let err = controller.lab_get_by_title("nope", false).await.unwrap_err();
    assert!(err.is_not_found());
}

// ── Nodes ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_node_create_removes_node_when_patch_fails() {
    let (server, controller) = setup("2.7.0", false).await;

    mount_json(&server, "POST", "labs/lab1/nodes", json!({ "id": "node3" })).await;
    Mock::given(method("PATCH"))
        .and(path("/api/v0/labs/lab1/nodes/node3"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad ram value"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v0/labs/lab1/nodes/node3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut node = Node::new("lab1", "r3", "iosv");
    node.ram = Some(1);
    let err = controller.node_create(&node).await.unwrap_err();
    assert!(
        matches!(err, CoreError::Api { status: 400, ref message } if message == "bad ram value"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn test_node_create_follows_up_with_get() {
    let (server, controller) = setup("2.7.0", false).await;

    mount_json(&server, "POST", "labs/lab1/nodes", json!({ "id": "node3" })).await;
    mount_json(&server, "PATCH", "labs/lab1/nodes/node3", json!("node3")).await;
    mount_json(&server, "GET", "labs/lab1/nodes/node3", node_body("node3", "r3")).await;

    let node = controller
        .node_create(&Node::new("lab1", "r3", "alpine"))
        .await
        .unwrap();
    assert_eq!(node.id, "node3");
    assert_eq!(node.label, "r3");
}

#[tokio::test]
async fn test_named_configs_need_controller_support() {
    let (server, controller) = setup("2.6.0", false).await;
    Mock::given(method("PATCH"))
        .and(path("/api/v0/labs/lab1/nodes/node1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("node1")))
        .expect(0)
        .mount(&server)
        .await;

    let node = Node {
        id: "node1".into(),
        lab_id: "lab1".into(),
        ..Node::default()
    };
    let configs = vec![NamedConfig {
        name: "ios_config.txt".into(),
        content: "hostname r1".into(),
    }];
    let err = controller
        .node_set_named_configs(&node, configs)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NoNamedConfigSupport));
}

// ── Interfaces ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_interface_create_picks_requested_slot() {
    let (server, controller) = setup("2.7.0", false).await;
    mount_json(
        &server,
        "POST",
        "labs/lab1/interfaces",
        json!([
            { "id": "n1i0", "lab_id": "lab1", "node": "node1", "label": "eth0", "slot": 0,
              "type": "physical", "state": "DEFINED_ON_CORE" },
            { "id": "n1i1", "lab_id": "lab1", "node": "node1", "label": "eth1", "slot": 1,
              "type": "physical", "state": "DEFINED_ON_CORE" }
        ]),
    )
    .await;

    let iface = controller
        .interface_create("lab1", "node1", Some(1))
        .await
        .unwrap();
    assert_eq!(iface.label, "eth1");
    assert!(!iface.exists());
}

// ── Links ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_shallow_link_carries_ids_only() {
    let (server, controller) = setup("2.7.0", false).await;
    mount_json(&server, "GET", "labs/lab1/links/link1", link_body()).await;

    let link = controller.link_get("lab1", "link1", false).await.unwrap();
    assert_eq!(link.endpoint_a.interface_id, "n1i1");
    assert_eq!(link.endpoint_a.node_label, "");
}

#[tokio::test]
async fn test_deep_link_resolves_labels() {
    let (server, controller) = setup("2.7.0", false).await;
    mount_json(&server, "GET", "labs/lab1/links/link1", link_body()).await;
    mount_json(&server, "GET", "labs/lab1/nodes/node1", node_body("node1", "alpine-0")).await;
    mount_json(&server, "GET", "labs/lab1/nodes/node2", node_body("node2", "alpine-1")).await;
    mount_json(
        &server,
        "GET",
        "labs/lab1/interfaces/n1i1",
        iface_body("n1i1", "node1", "52:54:00:0c:e0:69"),
    )
    .await;
    mount_json(
        &server,
        "GET",
        "labs/lab1/interfaces/n2i1",
        iface_body("n2i1", "node2", "52:54:00:0c:e0:70"),
    )
    .await;

    let link = controller.link_get("lab1", "link1", true).await.unwrap();
    assert_eq!(link.endpoint_a.node_label, "alpine-0");
    assert_eq!(link.endpoint_b.node_label, "alpine-1");
}
