//! Permission evaluation against a role catalog.
//!
//! # Purpose and responsibility
//! Answers "does this identity hold permission P", either globally or for a
//! specific workspace/deployment. Decisions are pure functions of the
//! identity's bindings and the catalog.
//!
//! # Key invariants and assumptions
//! - An absent identity holds nothing.
//! - `system.*` permissions ignore entity arguments and scan every binding.
//! - Scoped permissions are decided by the first binding targeting the entity
//!   alone; later bindings on the same entity are not merged in.
//! - The boolean checks never fail; the `check_*` variants turn `false` into
//!   [`AuthzError::Forbidden`] for call sites that must fail closed.
use crate::binding::{Identity, Scope};
use crate::catalog::RoleCatalog;
use crate::errors::{AuthzError, AuthzResult};
use crate::permission::{EntityType, is_system_permission};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PermissionEvaluator {
    catalog: Arc<RoleCatalog>,
}

impl PermissionEvaluator {
    pub fn new(catalog: Arc<RoleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    pub fn has_permission(
        &self,
        identity: Option<&Identity>,
        permission: &str,
        entity_type: Option<EntityType>,
        entity_id: Option<&str>,
    ) -> bool {
        let Some(identity) = identity else {
            return false;
        };
        if is_system_permission(permission) {
            return self.has_system_permission(Some(identity), permission);
        }
        let (Some(entity_type), Some(entity_id)) = (entity_type, entity_id) else {
            return false;
        };
        if entity_id.is_empty() {
            return false;
        }

        identity
            .role_bindings()
            .iter()
            .find(|binding| binding.scope.targets(entity_type, entity_id))
            .is_some_and(|binding| self.catalog.grants(&binding.role, permission))
    }

    pub fn has_system_permission(&self, identity: Option<&Identity>, permission: &str) -> bool {
        let Some(identity) = identity else {
            return false;
        };
        identity
            .role_bindings()
            .iter()
            .any(|binding| self.catalog.grants(&binding.role, permission))
    }

    pub fn check_permission(
        &self,
        identity: Option<&Identity>,
        permission: &str,
        entity_type: Option<EntityType>,
        entity_id: Option<&str>,
    ) -> AuthzResult<()> {
        if self.has_permission(identity, permission, entity_type, entity_id) {
            Ok(())
        } else {
            Err(AuthzError::Forbidden(permission.to_string()))
        }
    }

    pub fn check_system_permission(
        &self,
        identity: Option<&Identity>,
        permission: &str,
    ) -> AuthzResult<()> {
        if self.has_system_permission(identity, permission) {
            Ok(())
        } else {
            Err(AuthzError::Forbidden(permission.to_string()))
        }
    }

    /// Deployment ids the identity may act on with `permission`, in binding
    /// order without duplicates. Used to scope list queries.
    pub fn accessible_deployments_with_permission(
        &self,
        identity: Option<&Identity>,
        permission: &str,
    ) -> Vec<String> {
        let Some(identity) = identity else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        identity
            .role_bindings()
            .iter()
            .filter_map(|binding| match &binding.scope {
                Scope::Deployment(id) if self.catalog.grants(&binding.role, permission) => {
                    Some(id)
                }
                _ => None,
            })
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }
}
