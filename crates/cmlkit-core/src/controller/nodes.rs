// ── Node operations ──
//
// Writes answer with the bare node id, so every write is followed by a
// fresh read of the node.

use tracing::{debug, info, warn};

use cmlkit_api::SessionState;
use cmlkit_api::models::NodeConfigUpdate;

use super::Controller;
use crate::convert::{node_request, uses_named_configs};
use crate::error::CoreError;
use crate::model::{ElementState, NamedConfig, Node, NodeConfiguration};

impl Controller {
    /// Fetch one node (without interfaces).
    pub async fn node_get(&self, lab_id: &str, id: &str) -> Result<Node, CoreError> {
        Ok(Node::from(self.inner.api.get_node(lab_id, id).await?))
    }

    /// Fetch one node together with its interfaces.
    pub async fn node_get_with_interfaces(
        &self,
        lab_id: &str,
        id: &str,
    ) -> Result<Node, CoreError> {
        let mut node = self.node_get(lab_id, id).await?;
        node.interfaces = self.interfaces_for_node(lab_id, id).await?;
        Ok(node)
    }

    /// Create `node` in its lab with the default interfaces.
    ///
    /// The create call ignores most fields, so it is followed by a PATCH
    /// carrying everything except the node definition. If that PATCH is
    /// rejected the new node is deleted again and the PATCH error returned.
    pub async fn node_create(&self, node: &Node) -> Result<Node, CoreError> {
        let mut node = node.clone();
        node.state = ElementState::DefinedOnCore;
        self.require_named_configs(&node.configuration).await?;

        let created = self
            .inner
            .api
            .create_node(&node.lab_id, &node_request(&node, false))
            .await?;
        debug!(lab = %node.lab_id, node = %created.id, "node created, applying settings");

        if let Err(e) = self
            .inner
            .api
            .update_node(&node.lab_id, &created.id, &node_request(&node, true))
            .await
        {
            if let Err(cleanup) = self.inner.api.delete_node(&node.lab_id, &created.id).await {
                warn!(node = %created.id, error = %cleanup, "could not remove half-created node");
            }
            return Err(e.into());
        }

        info!(lab = %node.lab_id, node = %created.id, label = %node.label, "node created");
        self.node_get(&node.lab_id, &created.id).await
    }

    /// Apply `node`'s layout (and, while `DEFINED_ON_CORE`, its resources
    /// and configuration) to the controller.
    pub async fn node_update(&self, node: &Node) -> Result<Node, CoreError> {
        self.require_named_configs(&node.configuration).await?;
        self.inner
            .api
            .update_node(&node.lab_id, &node.id, &node_request(node, true))
            .await?;
        self.node_get(&node.lab_id, &node.id).await
    }

    /// Replace the node's day-0 configuration with a single text.
    pub async fn node_set_config(&self, node: &Node, configuration: &str) -> Result<Node, CoreError> {
        self.set_configuration(node, NodeConfiguration::Single(configuration.to_owned()))
            .await
    }

    /// Replace the node's configuration with named files. Needs a
    /// controller that supports named configurations.
    pub async fn node_set_named_configs(
        &self,
        node: &Node,
        configs: Vec<NamedConfig>,
    ) -> Result<Node, CoreError> {
        self.set_configuration(node, NodeConfiguration::Named(configs))
            .await
    }

    async fn set_configuration(
        &self,
        node: &Node,
        configuration: NodeConfiguration,
    ) -> Result<Node, CoreError> {
        self.require_named_configs(&configuration).await?;
        self.inner
            .api
            .set_node_configuration(&node.lab_id, &node.id, &NodeConfigUpdate { configuration })
            .await?;
        self.node_get(&node.lab_id, &node.id).await
    }

    pub async fn node_start(&self, node: &Node) -> Result<(), CoreError> {
        Ok(self.inner.api.start_node(&node.lab_id, &node.id).await?)
    }

    pub async fn node_stop(&self, node: &Node) -> Result<(), CoreError> {
        Ok(self.inner.api.stop_node(&node.lab_id, &node.id).await?)
    }

    /// Remove the node's VM and disks.
    pub async fn node_wipe(&self, node: &Node) -> Result<(), CoreError> {
        Ok(self.inner.api.wipe_node(&node.lab_id, &node.id).await?)
    }

    pub async fn node_destroy(&self, node: &Node) -> Result<(), CoreError> {
        Ok(self.inner.api.delete_node(&node.lab_id, &node.id).await?)
    }

    /// Named configurations need controller support, which is only known
    /// after the version check.
    async fn require_named_configs(
        &self,
        configuration: &NodeConfiguration,
    ) -> Result<(), CoreError> {
        if !uses_named_configs(configuration) {
            return Ok(());
        }
        if self.inner.api.state() == SessionState::Initial {
            self.inner.api.ready().await?;
        }
        if !self.inner.api.named_configs_supported() {
            return Err(CoreError::NoNamedConfigSupport);
        }
        Ok(())
    }
}
