//! Identity and role-binding model.
//!
//! # Purpose
//! Models the authenticated principal of a request and the role bindings it
//! carries. Users and service accounts share one [`Principal`] shape so the
//! evaluator never has to care which kind it is looking at.
//!
//! # Key invariants
//! - A binding targets at most one entity; [`Scope`] makes the other states
//!   unrepresentable.
//! - Binding order is significant: scoped evaluation takes the first match.
use crate::permission::{EntityType, is_workspace_role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Scope {
    Global,
    Workspace(String),
    Deployment(String),
}

impl Scope {
    pub fn entity_type(&self) -> Option<EntityType> {
        match self {
            Scope::Global => None,
            Scope::Workspace(_) => Some(EntityType::Workspace),
            Scope::Deployment(_) => Some(EntityType::Deployment),
        }
    }

    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Scope::Global => None,
            Scope::Workspace(id) | Scope::Deployment(id) => Some(id),
        }
    }

    pub fn targets(&self, entity_type: EntityType, entity_id: &str) -> bool {
        self.entity_type() == Some(entity_type) && self.entity_id() == Some(entity_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub role: String,
    pub scope: Scope,
}

impl RoleBinding {
    pub fn global(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            scope: Scope::Global,
        }
    }

    pub fn workspace(role: impl Into<String>, workspace_id: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            scope: Scope::Workspace(workspace_id.into()),
        }
    }

    pub fn deployment(role: impl Into<String>, deployment_id: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            scope: Scope::Deployment(deployment_id.into()),
        }
    }

    /// Workspace id of a workspace-class binding, if this is one.
    pub fn workspace_grant(&self) -> Option<&str> {
        match &self.scope {
            Scope::Workspace(id) if is_workspace_role(&self.role) => Some(id),
            _ => None,
        }
    }
}

/// View shared by every identity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role_bindings: Vec<RoleBinding>,
}

impl Principal {
    pub fn new(id: impl Into<String>, role_bindings: Vec<RoleBinding>) -> Self {
        Self {
            id: id.into(),
            role_bindings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    User(Principal),
    ServiceAccount(Principal),
}

impl Identity {
    pub fn principal(&self) -> &Principal {
        match self {
            Identity::User(principal) | Identity::ServiceAccount(principal) => principal,
        }
    }

    pub fn id(&self) -> &str {
        &self.principal().id
    }

    pub fn role_bindings(&self) -> &[RoleBinding] {
        &self.principal().role_bindings
    }

    pub fn is_service_account(&self) -> bool {
        matches!(self, Identity::ServiceAccount(_))
    }

    /// Append bindings after the existing ones, keeping the identity kind.
    pub fn with_additional_bindings(self, extra: Vec<RoleBinding>) -> Self {
        match self {
            Identity::User(mut principal) => {
                principal.role_bindings.extend(extra);
                Identity::User(principal)
            }
            Identity::ServiceAccount(mut principal) => {
                principal.role_bindings.extend(extra);
                Identity::ServiceAccount(principal)
            }
        }
    }
}
