use serde::{Deserialize, Serialize};

/// Verified identity attached to every request and socket connection.
/// Issued by the external auth collaborator; never constructed from
/// unverified input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActorIdentity {
    pub user_id: String,
    pub display_name: String,
}

impl ActorIdentity {
    pub fn with_user_id(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            user_id: user_id.clone(),
            display_name: user_id,
        }
    }
}
