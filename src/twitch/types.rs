//! Helix response models

use serde::{Deserialize, Serialize};

use crate::session::BroadcasterIdentity;

/// Standard Helix envelope: `{ "data": [...] }`
#[derive(Debug, Clone, Deserialize)]
pub struct HelixData<T> {
    pub data: Vec<T>,
}

/// Entry of `GET /helix/users`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelixUser {
    pub id: String,
    #[serde(default)]
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
}

impl From<HelixUser> for BroadcasterIdentity {
    fn from(user: HelixUser) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            profile_image_url: user.profile_image_url,
        }
    }
}
