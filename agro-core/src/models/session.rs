use serde::{Deserialize, Serialize};

/// Identity of the signed-in user, handed to the core by whoever owns the
/// session. Reports and clients are scoped to `owner_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session {
    pub owner_id: String,
}

impl Session {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
        }
    }
}
