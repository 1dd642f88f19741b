// ── Deep lab assembly ──
//
// Builds the full object graph of a lab from independent sub-resource
// fetches. Four tasks run concurrently on a `JoinSet`:
//
//   owner     GET users/{owner}
//   topology  GET labs/{id}/nodes, each node, then each node's interfaces
//   layer3    GET labs/{id}/layer3_addresses, merged after topology
//   links     GET labs/{id}/links and each link, resolved after topology
//
// The layer-3 and link tasks fetch right away and only block on the
// topology barrier before touching the node map. The first real failure
// cancels the siblings; the caller gets a complete lab or that error.

mod barrier;

use std::future::Future;
use std::sync::Arc;

use futures_util::future::try_join_all;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use cmlkit_api::ApiClient;
use cmlkit_api::models::Layer3Addresses;

use self::barrier::{TopologyReady, TopologyWait, topology_barrier};
use crate::convert::resolve_link;
use crate::error::CoreError;
use crate::model::{Interface, Lab, Link, Node, NodeMap, User};

type SharedNodes = Arc<Mutex<NodeMap>>;

/// What each task contributes to the lab.
enum Part {
    Owner(User),
    Topology,
    Layer3,
    Links(Vec<Link>),
}

/// Fill `lab` (as returned by a shallow `GET labs/{id}`) with its owner,
/// nodes, interfaces, layer-3 addresses, and links.
pub(crate) async fn assemble(api: Arc<ApiClient>, mut lab: Lab) -> Result<Lab, CoreError> {
    let cancel = CancellationToken::new();
    let nodes: SharedNodes = Arc::new(Mutex::new(NodeMap::new()));
    let (ready, layer3_wait, links_wait) = topology_barrier();

    debug!(lab = %lab.id, "assembling lab");

    let mut tasks: JoinSet<Result<Part, CoreError>> = JoinSet::new();
    tasks.spawn(guarded(
        cancel.clone(),
        "owner",
        fetch_owner(Arc::clone(&api), lab.owner.id.clone()),
    ));
    tasks.spawn(guarded(
        cancel.clone(),
        "topology",
        fetch_topology(Arc::clone(&api), lab.id.clone(), Arc::clone(&nodes), ready),
    ));
    tasks.spawn(guarded(
        cancel.clone(),
        "layer3",
        fetch_layer3(Arc::clone(&api), lab.id.clone(), Arc::clone(&nodes), layer3_wait),
    ));
    tasks.spawn(guarded(
        cancel.clone(),
        "links",
        fetch_links(Arc::clone(&api), lab.id.clone(), Arc::clone(&nodes), links_wait),
    ));

    let mut first_err: Option<CoreError> = None;
    let mut cancelled: Option<CoreError> = None;
    let mut owner = None;
    let mut links = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        let result = joined.unwrap_or_else(|e| Err(CoreError::Internal(format!("task failed: {e}"))));
        match result {
            Ok(Part::Owner(user)) => owner = Some(user),
            Ok(Part::Links(resolved)) => links = resolved,
            Ok(Part::Topology | Part::Layer3) => {}
            Err(e) if e.is_cancelled() => {
                cancelled.get_or_insert(e);
            }
            Err(e) => {
                if first_err.is_none() {
                    debug!(lab = %lab.id, error = %e, "assembly failed, cancelling siblings");
                    cancel.cancel();
                    first_err = Some(e);
                }
            }
        }
    }

    if let Some(err) = first_err.or(cancelled) {
        return Err(err);
    }

    if let Some(user) = owner {
        lab.owner = user;
    }
    lab.nodes = std::mem::take(&mut *nodes.lock());
    lab.links = links;

    info!(
        lab = %lab.id,
        nodes = lab.nodes.len(),
        links = lab.links.len(),
        "lab assembled"
    );
    Ok(lab)
}

/// Run `fut` until it finishes or `cancel` fires, whichever comes first.
async fn guarded<F>(cancel: CancellationToken, task: &'static str, fut: F) -> Result<Part, CoreError>
where
    F: Future<Output = Result<Part, CoreError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(CoreError::Cancelled { task }),
        result = fut => result,
    }
}

// ── Tasks ────────────────────────────────────────────────────────────

async fn fetch_owner(api: Arc<ApiClient>, owner: String) -> Result<Part, CoreError> {
    let user = api.get_user(&owner).await?;
    Ok(Part::Owner(User::from(user)))
}

async fn fetch_topology(
    api: Arc<ApiClient>,
    lab: String,
    nodes: SharedNodes,
    ready: TopologyReady,
) -> Result<Part, CoreError> {
    let ids = api.node_ids(&lab).await?;
    let fetched = try_join_all(ids.iter().map(|id| api.get_node(&lab, id))).await?;

    let mut map = NodeMap::new();
    for raw in fetched {
        let mut node = Node::from(raw);
        node.interfaces = api
            .node_interfaces(&lab, &node.id)
            .await?
            .into_iter()
            .map(Interface::from)
            .collect();
        map.insert(node.id.clone(), node);
    }
    debug!(lab = %lab, nodes = map.len(), "topology fetched");

    *nodes.lock() = map;
    ready.release();
    Ok(Part::Topology)
}

async fn fetch_layer3(
    api: Arc<ApiClient>,
    lab: String,
    nodes: SharedNodes,
    wait: TopologyWait,
) -> Result<Part, CoreError> {
    let addresses = api.layer3_addresses(&lab).await?;
    wait.wait().await?;
    merge_layer3(&mut nodes.lock(), addresses);
    Ok(Part::Layer3)
}

async fn fetch_links(
    api: Arc<ApiClient>,
    lab: String,
    nodes: SharedNodes,
    wait: TopologyWait,
) -> Result<Part, CoreError> {
    let ids = api.link_ids(&lab).await?;
    let fetched = try_join_all(ids.iter().map(|id| api.get_link(&lab, id))).await?;
    wait.wait().await?;

    let map = nodes.lock();
    let mut links = fetched
        .into_iter()
        .map(|raw| resolve_link(raw, &map))
        .collect::<Result<Vec<_>, _>>()?;
    links.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(Part::Links(links))
}

// ── Layer-3 merge ────────────────────────────────────────────────────

/// Attach reported IPs to the interface carrying the same MAC. Nodes or
/// MACs that are not part of the topology are skipped.
fn merge_layer3(nodes: &mut NodeMap, addresses: Layer3Addresses) {
    for (node_id, report) in addresses {
        let Some(node) = nodes.get_mut(&node_id) else {
            continue;
        };
        for (mac, ips) in report.interfaces {
            if let Some(iface) = node.interfaces.iter_mut().find(|i| i.has_mac(&mac)) {
                iface.ip4 = ips.ip4.unwrap_or_default();
                iface.ip6 = ips.ip6.unwrap_or_default();
            }
        }
    }
}
