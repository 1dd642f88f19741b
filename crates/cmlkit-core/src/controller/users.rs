// ── User lookups ──

use super::Controller;
use crate::error::CoreError;
use crate::model::User;

impl Controller {
    pub async fn user_get(&self, id: &str) -> Result<User, CoreError> {
        Ok(User::from(self.inner.api.get_user(id).await?))
    }

    /// Resolve a username to its id, then fetch the user.
    pub async fn user_by_name(&self, name: &str) -> Result<User, CoreError> {
        let id = self.inner.api.user_id_by_name(name).await?;
        self.user_get(&id).await
    }

    /// All users, ordered by id.
    pub async fn users(&self) -> Result<Vec<User>, CoreError> {
        let mut users: Vec<User> = self
            .inner
            .api
            .list_users()
            .await?
            .into_iter()
            .map(User::from)
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }
}
