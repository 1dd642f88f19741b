// ── Interface operations ──
//
// Interfaces are never cached on their own; creating or deleting one
// updates the owning node inside a cached lab, if there is one.

use tracing::debug;

use cmlkit_api::models::{InterfaceCreate, InterfaceCreated};

use super::Controller;
use crate::error::CoreError;
use crate::model::Interface;

impl Controller {
    pub async fn interface_get(&self, lab_id: &str, id: &str) -> Result<Interface, CoreError> {
        Ok(Interface::from(
            self.inner.api.get_interface(lab_id, id).await?,
        ))
    }

    /// All interfaces of a node, in slot order.
    pub async fn interfaces_for_node(
        &self,
        lab_id: &str,
        node_id: &str,
    ) -> Result<Vec<Interface>, CoreError> {
        Ok(self
            .inner
            .api
            .node_interfaces(lab_id, node_id)
            .await?
            .into_iter()
            .map(Interface::from)
            .collect())
    }

    /// Add an interface to a node. With a `slot`, the controller also
    /// creates every missing interface below it; the one at `slot` is
    /// returned.
    pub async fn interface_create(
        &self,
        lab_id: &str,
        node_id: &str,
        slot: Option<u32>,
    ) -> Result<Interface, CoreError> {
        let body = InterfaceCreate {
            node: node_id.to_owned(),
            slot,
        };
        let raw = match self.inner.api.create_interface(lab_id, &body).await? {
            InterfaceCreated::One(iface) => iface,
            InterfaceCreated::Many(list) => {
                let picked = match slot {
                    Some(wanted) => list.into_iter().find(|i| i.slot == Some(wanted)),
                    None => list.into_iter().last(),
                };
                picked.ok_or_else(|| {
                    CoreError::not_found("interface", format!("{node_id} slot {slot:?}"))
                })?
            }
        };

        let iface = Interface::from(raw);
        debug!(lab = lab_id, node = node_id, interface = %iface.id, "interface created");
        self.inner.cache.insert_interface(&iface, Ok(()))?;
        Ok(iface)
    }

    /// Delete an interface and drop it from its cached node.
    pub async fn interface_destroy(&self, iface: &Interface) -> Result<(), CoreError> {
        let deleted = self
            .inner
            .api
            .delete_interface(&iface.lab_id, &iface.id)
            .await
            .map_err(CoreError::from);
        self.inner.cache.remove_interface(iface, deleted)
    }
}
