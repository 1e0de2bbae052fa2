//! Role catalog built from configuration.
//!
//! # Purpose and responsibility
//! Maps role keys (`WORKSPACE_ADMIN`) to the permission strings they grant.
//! Configuration arrives in one of two shapes and is normalized once, at load
//! time, into the canonical mapping.
//!
//! # Key invariants and assumptions
//! - The catalog has no write path after construction; share it via `Arc`.
//! - Lookups are total: an unknown role key grants nothing.
//! - Permissions are unique within a role and membership is `O(log n)`.
//!
//! # Accepted shapes
//! Canonical:
//! ```yaml
//! SYSTEM_EDITOR:
//!   name: System Editor
//!   permissions:
//!     system.iam.update:
//! ```
//! Legacy:
//! ```yaml
//! - id: SYSTEM_EDITOR
//!   name: System Editor
//!   permissions:
//!     - system.iam.update
//! ```
use crate::errors::AuthzResult;
use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

const BUILTIN_ROLES: &str = include_str!("roles.yaml");

static EMPTY_ROLE: Role = Role {
    name: String::new(),
    permissions: PermissionSet(BTreeSet::new()),
};

/// Set of permission strings granted by a role.
///
/// Deserializes from a list of strings or from a mapping whose keys are the
/// permissions (values are ignored, usually `null`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Listed(Vec<String>),
            Marked(BTreeMap<String, IgnoredAny>),
            Empty(()),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Listed(perms) => perms.into_iter().collect(),
            Repr::Marked(perms) => perms.into_keys().collect(),
            Repr::Empty(()) => PermissionSet::default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub permissions: PermissionSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyRole {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Role configuration as read from disk, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RolesConfig {
    Legacy(Vec<LegacyRole>),
    Canonical(HashMap<String, Role>),
}

impl RolesConfig {
    /// Produce the canonical role-key -> role mapping. Canonical input is
    /// returned as-is.
    pub fn normalize(self) -> HashMap<String, Role> {
        match self {
            RolesConfig::Canonical(roles) => roles,
            RolesConfig::Legacy(roles) => roles
                .into_iter()
                .map(|role| {
                    (
                        role.id,
                        Role {
                            name: role.name,
                            permissions: role.permissions.into_iter().collect(),
                        },
                    )
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleCatalog {
    roles: HashMap<String, Role>,
}

impl RoleCatalog {
    pub fn new(config: RolesConfig) -> Self {
        Self {
            roles: config.normalize(),
        }
    }

    pub fn from_yaml_str(raw: &str) -> AuthzResult<Self> {
        let config: RolesConfig = serde_yaml::from_str(raw)?;
        let catalog = Self::new(config);
        tracing::debug!(roles = catalog.len(), "role catalog loaded");
        Ok(catalog)
    }

    /// The role table shipped with the control plane.
    pub fn builtin() -> AuthzResult<Self> {
        Self::from_yaml_str(BUILTIN_ROLES)
    }

    /// Look up a role. Unknown keys yield an unnamed role with no permissions.
    pub fn role(&self, key: &str) -> &Role {
        self.roles.get(key).unwrap_or(&EMPTY_ROLE)
    }

    pub fn grants(&self, key: &str, permission: &str) -> bool {
        self.role(key).permissions.contains(permission)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.roles.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl From<RolesConfig> for RoleCatalog {
    fn from(config: RolesConfig) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical() -> HashMap<String, Role> {
        let mut roles = HashMap::new();
        roles.insert(
            "A".to_string(),
            Role {
                name: "Admin".to_string(),
                permissions: ["x", "y"].into_iter().collect(),
            },
        );
        roles
    }

    #[test]
    fn legacy_list_normalizes_to_mapping() {
        let raw = r#"
- id: A
  name: Admin
  permissions:
    - x
    - y
"#;
        let config: RolesConfig = serde_yaml::from_str(raw).expect("yaml");
        assert!(matches!(config, RolesConfig::Legacy(_)));
        assert_eq!(config.normalize(), canonical());
    }

    #[test]
    fn canonical_input_is_returned_unchanged() {
        let once = RolesConfig::Canonical(canonical()).normalize();
        let twice = RolesConfig::Canonical(once.clone()).normalize();
        assert_eq!(once, canonical());
        assert_eq!(twice, once);
    }

    #[test]
    fn canonical_yaml_accepts_marker_keys_and_lists() {
        let raw = r#"
A:
  name: Admin
  permissions:
    ? x
    y: null
B:
  name: Listed
  permissions: [x]
C:
  name: Nothing
  permissions:
"#;
        let catalog = RoleCatalog::from_yaml_str(raw).expect("catalog");
        assert_eq!(catalog.role("A"), &canonical()["A"]);
        assert!(catalog.grants("B", "x"));
        assert!(catalog.role("C").permissions.is_empty());
    }

    #[test]
    fn duplicate_legacy_permissions_collapse() {
        let config = RolesConfig::Legacy(vec![LegacyRole {
            id: "A".to_string(),
            name: "Admin".to_string(),
            permissions: vec!["x".to_string(), "x".to_string()],
        }]);
        let catalog = RoleCatalog::new(config);
        assert_eq!(catalog.role("A").permissions.len(), 1);
    }

    #[test]
    fn unknown_role_grants_nothing() {
        let catalog = RoleCatalog::new(RolesConfig::Canonical(canonical()));
        assert!(!catalog.contains("MISSING"));
        assert!(catalog.role("MISSING").permissions.is_empty());
        assert!(!catalog.grants("MISSING", "x"));
    }

    #[test]
    fn builtin_catalog_parses() {
        let catalog = RoleCatalog::builtin().expect("builtin");
        assert!(catalog.grants("SYSTEM_ADMIN", "system.iam.update"));
        assert!(catalog.grants("WORKSPACE_ADMIN", "workspace.deployments.get"));
        assert!(catalog.grants("DEPLOYMENT_ADMIN", "deployment.logs.read"));
        for key in ["WORKSPACE_ADMIN", "WORKSPACE_EDITOR", "WORKSPACE_VIEWER"] {
            let twin = crate::permission::deployment_role_for(key);
            assert!(catalog.contains(&twin), "missing {twin}");
        }
    }

    #[test]
    fn invalid_yaml_is_a_config_error() {
        let err = RoleCatalog::from_yaml_str("- just\n- strings\n").expect_err("invalid");
        assert!(matches!(err, crate::AuthzError::Config(_)));
    }
}
