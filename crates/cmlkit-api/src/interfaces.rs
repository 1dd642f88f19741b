// Interface endpoints

use crate::client::{ApiClient, CallPhase};
use crate::error::Error;
use crate::models::{InterfaceCreate, InterfaceCreated, InterfaceResponse};

impl ApiClient {
    /// `GET labs/{lab}/nodes/{node}/interfaces?data=true`: full interface
    /// objects of one node, in slot order.
    pub async fn node_interfaces(
        &self,
        lab: &str,
        node: &str,
    ) -> Result<Vec<InterfaceResponse>, Error> {
        self.get(
            &format!("labs/{lab}/nodes/{node}/interfaces?data=true"),
            CallPhase::Normal,
        )
        .await
    }

    /// `GET labs/{lab}/interfaces/{id}`
    pub async fn get_interface(&self, lab: &str, id: &str) -> Result<InterfaceResponse, Error> {
        self.get(&format!("labs/{lab}/interfaces/{id}"), CallPhase::Normal)
            .await
    }

    /// `POST labs/{lab}/interfaces`
    pub async fn create_interface(
        &self,
        lab: &str,
        body: &InterfaceCreate,
    ) -> Result<InterfaceCreated, Error> {
        self.post(&format!("labs/{lab}/interfaces"), body, CallPhase::Normal)
            .await
    }

    /// `DELETE labs/{lab}/interfaces/{id}`
    pub async fn delete_interface(&self, lab: &str, id: &str) -> Result<(), Error> {
        self.delete(&format!("labs/{lab}/interfaces/{id}"), CallPhase::Normal)
            .await
    }
}
