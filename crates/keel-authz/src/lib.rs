//! Keel authn/authz primitives shared by the control plane and its tooling.
//!
//! # Purpose
//! Centralizes the role catalog, credential classification and verification,
//! the identity/role-binding model, and the permission evaluator.
//!
//! # How it fits
//! The control-plane service loads identities from its store and asks the
//! evaluator for decisions. Nothing in this crate performs I/O.
//!
//! # Key invariants
//! - The role catalog is immutable after construction and shared behind `Arc`.
//! - Unknown role keys resolve to an empty permission set, never an error.
//! - Permissions with a leading `system` segment are global and ignore scope.
//! - Token verification failures degrade to "no claims", never an error.
//!
//! # Examples
//! ```rust
//! use keel_authz::{Identity, PermissionEvaluator, Principal, RoleBinding, RoleCatalog};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(RoleCatalog::builtin().expect("builtin roles"));
//! let evaluator = PermissionEvaluator::new(catalog);
//! let user = Identity::User(Principal::new(
//!     "u1",
//!     vec![RoleBinding::global("SYSTEM_ADMIN")],
//! ));
//! assert!(evaluator.has_system_permission(Some(&user), "system.iam.update"));
//! ```
//!
//! # Common pitfalls
//! - Scoped checks use the first binding that targets the entity; a second
//!   binding on the same entity is never consulted.

mod binding;
mod catalog;
mod errors;
mod evaluator;
mod permission;
mod token;

pub use binding::{Identity, Principal, RoleBinding, Scope};
pub use catalog::{LegacyRole, PermissionSet, Role, RoleCatalog, RolesConfig};
pub use errors::{AuthzError, AuthzResult};
pub use evaluator::PermissionEvaluator;
pub use permission::{
    EntityType, PERM_DEPLOYMENT_CONFIG_GET, PERM_DEPLOYMENT_LOGS_READ, PERM_SYSTEM_USERS_GET,
    PERM_WORKSPACE_DEPLOYMENTS_GET, ROLE_CLASS_DEPLOYMENT, ROLE_CLASS_WORKSPACE, SYSTEM_PREFIX,
    deployment_role_for, is_system_permission, is_workspace_role,
};
pub use token::{
    Claims, Credential, SERVICE_ACCOUNT_KEY_LEN, TokenIssuer, TokenVerifier, classify,
    is_service_account,
};
