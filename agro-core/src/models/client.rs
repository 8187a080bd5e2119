use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A producer or property that reports are filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}
