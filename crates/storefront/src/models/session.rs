//! Types stored in the session.

use serde::{Deserialize, Serialize};

use crate::services::Identity;

/// The signed-in caller, as remembered between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity provider account id.
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl CurrentUser {
    /// Whether the caller carries `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<Identity> for CurrentUser {
    fn from(identity: Identity) -> Self {
        Self {
            uid: identity.uid,
            email: identity.email,
            roles: identity.roles,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for the signed-in caller.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the serialized cart snapshot.
    pub const CART_STORAGE: &str = "cart-storage";

    /// Key for the identity provider token used for catalog writes.
    pub const ID_TOKEN: &str = "firebase_id_token";
}
