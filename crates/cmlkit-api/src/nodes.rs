// Node endpoints
//
// When the controller supports named configurations, node reads ask for
// the operational view including configuration files; otherwise the
// default (simplified) representation is returned.

use tracing::debug;

use crate::client::{ApiClient, CallPhase};
use crate::error::Error;
use crate::models::{CreatedResponse, NodeConfigUpdate, NodeCreateUpdate, NodeResponse};

const NAMED_CONFIG_QUERY: &str = "operational=true&exclude_configurations=false";

impl ApiClient {
    /// `GET labs/{lab}/nodes`: node ids of a lab.
    pub async fn node_ids(&self, lab: &str) -> Result<Vec<String>, Error> {
        self.get(&format!("labs/{lab}/nodes"), CallPhase::Normal).await
    }

    /// `GET labs/{lab}/nodes/{id}`
    pub async fn get_node(&self, lab: &str, id: &str) -> Result<NodeResponse, Error> {
        self.ensure_version_checked().await?;
        let mut path = format!("labs/{lab}/nodes/{id}");
        if self.named_configs_supported() {
            path.push('?');
            path.push_str(NAMED_CONFIG_QUERY);
        }
        debug!(lab, node = id, "fetching node");
        self.get(&path, CallPhase::Normal).await
    }

    /// `POST labs/{lab}/nodes?populate_interfaces=true`: creates the node
    /// with its default interfaces. Only the new id comes back.
    pub async fn create_node(
        &self,
        lab: &str,
        body: &NodeCreateUpdate,
    ) -> Result<CreatedResponse, Error> {
        self.post(
            &format!("labs/{lab}/nodes?populate_interfaces=true"),
            body,
            CallPhase::Normal,
        )
        .await
    }

    /// `PATCH labs/{lab}/nodes/{id}`: the controller answers with the
    /// node id as a bare JSON string.
    pub async fn update_node(
        &self,
        lab: &str,
        id: &str,
        body: &NodeCreateUpdate,
    ) -> Result<String, Error> {
        self.patch(&format!("labs/{lab}/nodes/{id}"), body, CallPhase::Normal)
            .await
    }

    /// `PATCH labs/{lab}/nodes/{id}` with only the configuration.
    pub async fn set_node_configuration(
        &self,
        lab: &str,
        id: &str,
        body: &NodeConfigUpdate,
    ) -> Result<String, Error> {
        self.patch(&format!("labs/{lab}/nodes/{id}"), body, CallPhase::Normal)
            .await
    }

    /// `PUT labs/{lab}/nodes/{id}/state/start`
    pub async fn start_node(&self, lab: &str, id: &str) -> Result<(), Error> {
        self.put(&format!("labs/{lab}/nodes/{id}/state/start"), CallPhase::Normal)
            .await
    }

    /// `PUT labs/{lab}/nodes/{id}/state/stop`
    pub async fn stop_node(&self, lab: &str, id: &str) -> Result<(), Error> {
        self.put(&format!("labs/{lab}/nodes/{id}/state/stop"), CallPhase::Normal)
            .await
    }

    /// `PUT labs/{lab}/nodes/{id}/wipe_disks`: removes the VM and its disks.
    pub async fn wipe_node(&self, lab: &str, id: &str) -> Result<(), Error> {
        self.put(&format!("labs/{lab}/nodes/{id}/wipe_disks"), CallPhase::Normal)
            .await
    }

    /// `DELETE labs/{lab}/nodes/{id}`
    pub async fn delete_node(&self, lab: &str, id: &str) -> Result<(), Error> {
        self.delete(&format!("labs/{lab}/nodes/{id}"), CallPhase::Normal)
            .await
    }
}
