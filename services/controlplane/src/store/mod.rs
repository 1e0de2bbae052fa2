//! Store contract required by the auth layer.
//!
//! # Purpose
//! Abstracts the external data layer behind the three reads identity
//! resolution needs. Timeouts and retries are the implementation's concern.
use crate::model::{DeploymentRecord, ServiceAccountRecord, UserRecord};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn user_with_role_bindings(&self, user_id: &str) -> StoreResult<Option<UserRecord>>;
    async fn service_account_by_key(
        &self,
        api_key: &str,
    ) -> StoreResult<Option<ServiceAccountRecord>>;
    /// All non-deleted deployments owned by any of `workspace_ids`, in one call.
    async fn active_deployments_in_workspaces(
        &self,
        workspace_ids: &[String],
    ) -> StoreResult<Vec<DeploymentRecord>>;
    async fn deployment(&self, deployment_id: &str) -> StoreResult<Option<DeploymentRecord>>;
    async fn list_users(&self) -> StoreResult<Vec<UserRecord>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
