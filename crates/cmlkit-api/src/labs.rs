// Lab endpoints
//
// Lab metadata CRUD, lifecycle actions, import, and the per-lab layer-3
// address report used by the deep fetch.

use tracing::debug;

use crate::client::{ApiClient, CallPhase};
use crate::error::Error;
use crate::executor::ApiRequest;
use crate::models::{LabCreateUpdate, LabImportResponse, LabResponse, LabTiles, Layer3Addresses};

impl ApiClient {
    /// `GET labs`: ids of every lab visible to the user.
    pub async fn list_lab_ids(&self) -> Result<Vec<String>, Error> {
        self.get("labs", CallPhase::Normal).await
    }

    /// `GET labs/{id}`
    pub async fn get_lab(&self, id: &str) -> Result<LabResponse, Error> {
        debug!(lab = id, "fetching lab");
        self.get(&format!("labs/{id}"), CallPhase::Normal).await
    }

    /// `GET populate_lab_tiles`: metadata of all labs in one call.
    pub async fn lab_tiles(&self) -> Result<LabTiles, Error> {
        self.get("populate_lab_tiles", CallPhase::Normal).await
    }

    /// `POST labs`
    pub async fn create_lab(&self, body: &LabCreateUpdate) -> Result<LabResponse, Error> {
        self.post("labs", body, CallPhase::Normal).await
    }

    /// `PATCH labs/{id}`
    pub async fn update_lab(&self, id: &str, body: &LabCreateUpdate) -> Result<LabResponse, Error> {
        self.patch(&format!("labs/{id}"), body, CallPhase::Normal).await
    }

    /// `DELETE labs/{id}`
    pub async fn delete_lab(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("labs/{id}"), CallPhase::Normal).await
    }

    /// `POST import` with a topology document (YAML) as the body.
    pub async fn import_lab(&self, topology: &str) -> Result<LabImportResponse, Error> {
        let request = ApiRequest::post("import").raw(topology);
        self.fetch(request, CallPhase::Normal).await
    }

    /// `PUT labs/{id}/start`
    pub async fn start_lab(&self, id: &str) -> Result<(), Error> {
        self.put(&format!("labs/{id}/start"), CallPhase::Normal).await
    }

    /// `PUT labs/{id}/stop`
    pub async fn stop_lab(&self, id: &str) -> Result<(), Error> {
        self.put(&format!("labs/{id}/stop"), CallPhase::Normal).await
    }

    /// `PUT labs/{id}/wipe`
    pub async fn wipe_lab(&self, id: &str) -> Result<(), Error> {
        self.put(&format!("labs/{id}/wipe"), CallPhase::Normal).await
    }

    /// `GET labs/{id}/check_if_converged`
    pub async fn lab_converged(&self, id: &str) -> Result<bool, Error> {
        self.get(&format!("labs/{id}/check_if_converged"), CallPhase::Normal)
            .await
    }

    /// `GET labs/{id}/layer3_addresses`: per node, per MAC address.
    pub async fn layer3_addresses(&self, id: &str) -> Result<Layer3Addresses, Error> {
        self.get(&format!("labs/{id}/layer3_addresses"), CallPhase::Normal)
            .await
    }
}
