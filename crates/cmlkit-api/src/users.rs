// User endpoints (read side only)

use crate::client::{ApiClient, CallPhase};
use crate::error::Error;
use crate::models::UserResponse;

impl ApiClient {
    /// `GET users/{id}`
    pub async fn get_user(&self, id: &str) -> Result<UserResponse, Error> {
        self.get(&format!("users/{id}"), CallPhase::Normal).await
    }

    /// `GET users/{name}/id`: resolves a username to its id.
    pub async fn user_id_by_name(&self, name: &str) -> Result<String, Error> {
        self.get(&format!("users/{name}/id"), CallPhase::Normal).await
    }

    /// `GET users`
    pub async fn list_users(&self) -> Result<Vec<UserResponse>, Error> {
        self.get("users", CallPhase::Normal).await
    }
}
