// ── Link operations ──

use tracing::info;

use cmlkit_api::models::LinkCreate;

use super::Controller;
use crate::convert::{resolve_link, unresolved_link};
use crate::error::CoreError;
use crate::model::{Interface, Link, Node, NodeMap};

impl Controller {
    /// Fetch a link. A shallow link only carries endpoint ids; a deep one
    /// also resolves node and interface labels, from the cached lab when
    /// possible.
    pub async fn link_get(&self, lab_id: &str, id: &str, deep: bool) -> Result<Link, CoreError> {
        let raw = self.inner.api.get_link(lab_id, id).await?;
        if !deep {
            return Ok(unresolved_link(raw));
        }

        let from_cache = self
            .inner
            .cache
            .get_if_cached(lab_id, false)
            .and_then(|cached| resolve_link(raw.clone(), &cached.read().nodes).ok());
        if let Some(link) = from_cache {
            return Ok(link);
        }

        let api = &self.inner.api;
        let (iface_a, iface_b, node_a, node_b) = tokio::try_join!(
            api.get_interface(lab_id, &raw.interface_a),
            api.get_interface(lab_id, &raw.interface_b),
            api.get_node(lab_id, &raw.node_a),
            api.get_node(lab_id, &raw.node_b),
        )?;

        let mut nodes = NodeMap::new();
        for (node, iface) in [(node_a, iface_a), (node_b, iface_b)] {
            let entry = nodes
                .entry(node.id.clone())
                .or_insert_with(|| Node::from(node));
            entry.interfaces.push(Interface::from(iface));
        }
        resolve_link(raw, &nodes)
    }

    /// Connect two interfaces and return the new link, resolved.
    pub async fn link_create(
        &self,
        lab_id: &str,
        interface_a: &str,
        interface_b: &str,
    ) -> Result<Link, CoreError> {
        let body = LinkCreate {
            src_int: interface_a.to_owned(),
            dst_int: interface_b.to_owned(),
        };
        let created = self.inner.api.create_link(lab_id, &body).await?;
        info!(lab = lab_id, link = %created.id, "link created");
        self.link_get(lab_id, &created.id, true).await
    }

    pub async fn link_destroy(&self, link: &Link) -> Result<(), CoreError> {
        Ok(self.inner.api.delete_link(&link.lab_id, &link.id).await?)
    }
}
