//! In-memory implementation of the identity store.
//!
//! # Purpose
//! Implements `IdentityStore` with `HashMap`s guarded by `tokio::sync::RwLock`.
//! It backs local development and tests; state is lost on restart.
//!
//! # Consistency
//! Reads take read locks and may run concurrently; writes are serialized.
//! Deployments keep insertion order so batched lookups are deterministic.
use super::{IdentityStore, StoreError, StoreResult};
use crate::model::{DeploymentRecord, ServiceAccountRecord, UserRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Initial contents for a store, read from YAML at startup.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub users: Vec<UserRecord>,
    pub service_accounts: Vec<ServiceAccountRecord>,
    pub deployments: Vec<DeploymentRecord>,
}

/// `IdentityStore` backed by process memory.
///
/// # What it does
/// Holds users, service accounts, and deployments, and counts the reads the
/// auth layer issues against them.
///
/// # Invariants
/// - User ids, API keys, and deployment ids are unique within the store.
/// - Soft-deleted deployments stay in the list but are never returned by
///   reads.
#[derive(Default)]
pub struct InMemoryStore {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
    /// Service accounts keyed by API key.
    service_accounts: Arc<RwLock<HashMap<String, ServiceAccountRecord>>>,
    deployments: Arc<RwLock<Vec<DeploymentRecord>>>,
    /// Number of batched deployment lookups served; lets tests assert there
    /// is no per-workspace fan-out.
    deployment_queries: AtomicU64,
    /// Number of user and service-account reads served.
    identity_lookups: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated from seed data.
    ///
    /// # What it does
    /// Inserts users, then service accounts, then deployments, in file order.
    ///
    /// # Errors
    /// - `StoreError::Conflict` if the seed repeats a user id, API key, or
    ///   deployment id.
    pub async fn from_seed(seed: SeedData) -> StoreResult<Self> {
        let store = Self::new();
        for user in seed.users {
            store.insert_user(user).await?;
        }
        for account in seed.service_accounts {
            store.insert_service_account(account).await?;
        }
        for deployment in seed.deployments {
            store.insert_deployment(deployment).await?;
        }
        Ok(store)
    }

    /// Insert a user with its role bindings.
    ///
    /// # Errors
    /// - `StoreError::Conflict` if a user with the same id exists.
    pub async fn insert_user(&self, user: UserRecord) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(StoreError::Conflict("user exists".into()));
        }
        users.insert(user.id.clone(), user);
        Ok(())
    }

    /// Insert a service account keyed by its API key.
    ///
    /// # Errors
    /// - `StoreError::Conflict` if the API key is already registered.
    pub async fn insert_service_account(&self, account: ServiceAccountRecord) -> StoreResult<()> {
        let mut accounts = self.service_accounts.write().await;
        if accounts.contains_key(&account.api_key) {
            return Err(StoreError::Conflict("api key exists".into()));
        }
        accounts.insert(account.api_key.clone(), account);
        Ok(())
    }

    /// Append a deployment; insertion order is the order reads return.
    ///
    /// # Errors
    /// - `StoreError::Conflict` if a deployment with the same id exists.
    pub async fn insert_deployment(&self, deployment: DeploymentRecord) -> StoreResult<()> {
        let mut deployments = self.deployments.write().await;
        if deployments.iter().any(|existing| existing.id == deployment.id) {
            return Err(StoreError::Conflict("deployment exists".into()));
        }
        deployments.push(deployment);
        Ok(())
    }

    /// Mark a deployment deleted at `at`.
    ///
    /// # What it does
    /// Sets `deleted_at`; the record stays but no read returns it afterwards.
    ///
    /// # Errors
    /// - `StoreError::NotFound` if no deployment has that id.
    pub async fn soft_delete_deployment(
        &self,
        deployment_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut deployments = self.deployments.write().await;
        let deployment = deployments
            .iter_mut()
            .find(|deployment| deployment.id == deployment_id)
            .ok_or_else(|| StoreError::NotFound("deployment".into()))?;
        deployment.deleted_at = Some(at);
        Ok(())
    }

    /// Batched deployment reads served so far.
    pub fn deployment_query_count(&self) -> u64 {
        self.deployment_queries.load(Ordering::Relaxed)
    }

    /// User and service-account reads served so far.
    pub fn identity_lookup_count(&self) -> u64 {
        self.identity_lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn user_with_role_bindings(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
        self.identity_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn service_account_by_key(
        &self,
        api_key: &str,
    ) -> StoreResult<Option<ServiceAccountRecord>> {
        self.identity_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.service_accounts.read().await.get(api_key).cloned())
    }

    async fn active_deployments_in_workspaces(
        &self,
        workspace_ids: &[String],
    ) -> StoreResult<Vec<DeploymentRecord>> {
        self.deployment_queries.fetch_add(1, Ordering::Relaxed);
        let wanted: HashSet<&str> = workspace_ids.iter().map(String::as_str).collect();
        Ok(self
            .deployments
            .read()
            .await
            .iter()
            .filter(|deployment| {
                !deployment.is_deleted() && wanted.contains(deployment.workspace_id.as_str())
            })
            .cloned()
            .collect())
    }

    async fn deployment(&self, deployment_id: &str) -> StoreResult<Option<DeploymentRecord>> {
        Ok(self
            .deployments
            .read()
            .await
            .iter()
            .find(|deployment| deployment.id == deployment_id && !deployment.is_deleted())
            .cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_authz::RoleBinding;

    #[tokio::test]
    async fn batched_lookup_excludes_deleted_and_foreign_deployments() {
        let store = InMemoryStore::new();
        store
            .insert_deployment(DeploymentRecord::new("d1", "w1"))
            .await
            .expect("d1");
        store
            .insert_deployment(DeploymentRecord::new("d2", "w2"))
            .await
            .expect("d2");
        store
            .insert_deployment(DeploymentRecord::new("d3", "w1"))
            .await
            .expect("d3");
        store
            .insert_deployment(DeploymentRecord::new("d4", "w3"))
            .await
            .expect("d4");
        store
            .soft_delete_deployment("d3", Utc::now())
            .await
            .expect("delete");

        let found = store
            .active_deployments_in_workspaces(&["w1".to_string(), "w2".to_string()])
            .await
            .expect("lookup");
        let ids: Vec<&str> = found.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d2"]);
        assert_eq!(store.deployment_query_count(), 1);
        assert!(store.deployment("d3").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn identity_reads_are_counted() {
        let store = InMemoryStore::new();
        assert_eq!(store.identity_lookup_count(), 0);
        store.user_with_role_bindings("u1").await.expect("user");
        store.service_account_by_key("key").await.expect("account");
        assert_eq!(store.identity_lookup_count(), 2);
        assert_eq!(store.deployment_query_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_inserts_conflict() {
        let store = InMemoryStore::new();
        let user = UserRecord {
            id: "u1".to_string(),
            role_bindings: vec![RoleBinding::global("USER")],
        };
        store.insert_user(user.clone()).await.expect("insert");
        let err = store.insert_user(user).await.expect_err("conflict");
        assert!(matches!(err, StoreError::Conflict(_)));

        let err = store
            .soft_delete_deployment("missing", Utc::now())
            .await
            .expect_err("missing");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn seed_yaml_populates_store() {
        let seed: SeedData = serde_yaml::from_str(
            r#"
users:
  - id: u1
    role_bindings:
      - role: WORKSPACE_ADMIN
        scope: { type: workspace, id: w1 }
deployments:
  - id: d1
    workspace_id: w1
    deleted_at: null
  - id: d2
    workspace_id: w1
    deleted_at: 2024-01-01T00:00:00Z
"#,
        )
        .expect("seed");
        let store = InMemoryStore::from_seed(seed).await.expect("store");
        let user = store
            .user_with_role_bindings("u1")
            .await
            .expect("get")
            .expect("user");
        assert_eq!(
            user.role_bindings,
            vec![RoleBinding::workspace("WORKSPACE_ADMIN", "w1")]
        );
        let active = store
            .active_deployments_in_workspaces(&["w1".to_string()])
            .await
            .expect("lookup");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "d1");
    }

    #[tokio::test]
    async fn service_accounts_match_exact_key() {
        let store = InMemoryStore::new();
        let key = "k".repeat(32);
        store
            .insert_service_account(ServiceAccountRecord {
                id: "sa1".to_string(),
                api_key: key.clone(),
                role_binding: RoleBinding::workspace("WORKSPACE_EDITOR", "w1"),
            })
            .await
            .expect("insert");
        assert!(store.service_account_by_key(&key).await.expect("get").is_some());
        assert!(
            store
                .service_account_by_key(&key.to_uppercase())
                .await
                .expect("get")
                .is_none()
        );
    }
}
