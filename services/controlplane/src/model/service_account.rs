//! Service account records.
//!
//! A service account is bound to exactly one role. It is exposed to the
//! authorization layer with the same one-or-more binding shape a user has.
use keel_authz::{Identity, Principal, RoleBinding};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccountRecord {
    pub id: String,
    pub api_key: String,
    pub role_binding: RoleBinding,
}

impl From<ServiceAccountRecord> for Identity {
    fn from(account: ServiceAccountRecord) -> Self {
        Identity::ServiceAccount(Principal::new(account.id, vec![account.role_binding]))
    }
}
