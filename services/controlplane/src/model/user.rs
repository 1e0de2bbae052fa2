//! User records as returned by the store.
use keel_authz::{Identity, Principal, RoleBinding};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub role_bindings: Vec<RoleBinding>,
}

impl From<UserRecord> for Identity {
    fn from(user: UserRecord) -> Self {
        Identity::User(Principal::new(user.id, user.role_bindings))
    }
}
