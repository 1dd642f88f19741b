// Link endpoints

use crate::client::{ApiClient, CallPhase};
use crate::error::Error;
use crate::models::{CreatedResponse, LinkCreate, LinkResponse};

impl ApiClient {
    /// `GET labs/{lab}/links`: link ids of a lab.
    pub async fn link_ids(&self, lab: &str) -> Result<Vec<String>, Error> {
        self.get(&format!("labs/{lab}/links"), CallPhase::Normal).await
    }

    /// `GET labs/{lab}/links/{id}`
    pub async fn get_link(&self, lab: &str, id: &str) -> Result<LinkResponse, Error> {
        self.get(&format!("labs/{lab}/links/{id}"), CallPhase::Normal)
            .await
    }

    /// `POST labs/{lab}/links` between two interface ids.
    pub async fn create_link(&self, lab: &str, body: &LinkCreate) -> Result<CreatedResponse, Error> {
        self.post(&format!("labs/{lab}/links"), body, CallPhase::Normal)
            .await
    }

    /// `DELETE labs/{lab}/links/{id}`
    pub async fn delete_link(&self, lab: &str, id: &str) -> Result<(), Error> {
        self.delete(&format!("labs/{lab}/links/{id}"), CallPhase::Normal)
            .await
    }
}
