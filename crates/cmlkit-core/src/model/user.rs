// ── User domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A controller user. Labs reference their owner by id until a deep fetch
/// fills in the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub description: String,
    pub is_admin: bool,
    pub groups: Vec<String>,
    /// Ids of the labs this user owns.
    pub labs: Vec<String>,
    pub created: Option<DateTime<Utc>>,
}

impl User {
    /// Placeholder carrying only the id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}
