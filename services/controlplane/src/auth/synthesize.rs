//! Deployment role-binding synthesis.
//!
//! # Purpose and responsibility
//! The store has no deployment-level role bindings, only workspace-level
//! ones. This module projects each workspace-class binding onto every active
//! deployment of that workspace, at read time, so `WORKSPACE_ADMIN` on a
//! workspace acts as `DEPLOYMENT_ADMIN` on each of its deployments.
//!
//! # Key invariants and assumptions
//! - Exactly one batched deployment lookup per identity, covering every
//!   referenced workspace, and none when there are no workspace bindings.
//! - Original bindings are kept unchanged and come first.
//! - Synthesized bindings are never written back to the store.
//! - When several bindings target one workspace, the first one wins.
use crate::store::{IdentityStore, StoreResult};
use keel_authz::{Identity, RoleBinding, deployment_role_for};
use std::collections::HashSet;
use std::sync::Arc;

/// Derives read-time deployment bindings from workspace bindings.
#[derive(Clone)]
pub struct BindingSynthesizer {
    store: Arc<dyn IdentityStore>,
}

impl BindingSynthesizer {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Return `identity` with synthesized deployment bindings appended.
    ///
    /// # What it does
    /// Keeps the original bindings first and unchanged. An absent identity
    /// stays absent and costs no store call.
    ///
    /// # Errors
    /// - Propagates `StoreError` from the deployment query.
    pub async fn add_deployment_role_bindings(
        &self,
        identity: Option<Identity>,
    ) -> StoreResult<Option<Identity>> {
        let Some(identity) = identity else {
            return Ok(None);
        };
        let synthesized = self.deployment_role_bindings(&identity).await?;
        Ok(Some(identity.with_additional_bindings(synthesized)))
    }

    /// Only the synthesized bindings, in deployment order.
    ///
    /// # What it does
    /// Collects workspace-class bindings, issues one batched query for the
    /// active deployments of their workspaces, and maps each deployment to
    /// the deployment-class twin of the first matching workspace role.
    ///
    /// # Errors
    /// - Propagates `StoreError` from the deployment query.
    pub async fn deployment_role_bindings(
        &self,
        identity: &Identity,
    ) -> StoreResult<Vec<RoleBinding>> {
        let workspace_grants: Vec<(&str, &str)> = identity
            .role_bindings()
            .iter()
            .filter_map(|binding| {
                binding
                    .workspace_grant()
                    .map(|workspace_id| (workspace_id, binding.role.as_str()))
            })
            .collect();

        let mut seen = HashSet::new();
        let workspace_ids: Vec<String> = workspace_grants
            .iter()
            .filter(|(workspace_id, _)| seen.insert(*workspace_id))
            .map(|(workspace_id, _)| workspace_id.to_string())
            .collect();
        if workspace_ids.is_empty() {
            return Ok(Vec::new());
        }

        let deployments = self
            .store
            .active_deployments_in_workspaces(&workspace_ids)
            .await?;

        let synthesized: Vec<RoleBinding> = deployments
            .iter()
            .filter(|deployment| !deployment.is_deleted())
            .filter_map(|deployment| {
                let (_, role) = workspace_grants
                    .iter()
                    .find(|(workspace_id, _)| *workspace_id == deployment.workspace_id)?;
                Some(RoleBinding::deployment(
                    deployment_role_for(role),
                    deployment.id.clone(),
                ))
            })
            .collect();

        tracing::debug!(
            principal = identity.id(),
            workspaces = workspace_ids.len(),
            synthesized = synthesized.len(),
            "synthesized deployment role bindings"
        );
        metrics::histogram!("keel_synthesized_bindings").record(synthesized.len() as f64);
        Ok(synthesized)
    }
}
