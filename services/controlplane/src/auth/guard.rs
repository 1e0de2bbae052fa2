//! Per-operation access guard.
//!
//! # Purpose and responsibility
//! Wraps a single handler so it only runs for an authenticated principal that
//! holds the configured permission on every entity named in the call.
//!
//! # Key invariants and assumptions
//! - Identity is derived from the request credential through the same
//!   [`Authenticator`](crate::auth::identity::Authenticator) the middleware
//!   uses, so service-account keys work here too.
//! - When both a workspace id and a deployment id are supplied, the permission
//!   is checked against each independently and both must pass.
//! - The wrapped handler is not invoked unless every check succeeds.
//!
//! # Security considerations
//! - Every denial surfaces as the same generic forbidden response.
use crate::api::error::{ApiError, api_internal};
use crate::app::AppState;
use crate::auth::middleware::extract_credential;
use axum::http::HeaderMap;
use keel_authz::{AuthzError, EntityType, Identity};
use std::future::Future;

/// Entity ids carried by a guarded call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardArgs {
    pub workspace_id: Option<String>,
    pub deployment_id: Option<String>,
}

impl GuardArgs {
    pub fn workspace(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: Some(workspace_id.into()),
            deployment_id: None,
        }
    }

    pub fn deployment(deployment_id: impl Into<String>) -> Self {
        Self {
            workspace_id: None,
            deployment_id: Some(deployment_id.into()),
        }
    }
}

/// Execution context handed to a guarded handler.
#[derive(Debug, Clone)]
pub struct ResolverContext {
    pub identity: Identity,
}

/// Access requirement attached to one guarded operation.
///
/// # What it does
/// Names the permission an operation needs, or none when any authenticated
/// principal may call it.
///
/// # Invariants
/// - Declared as a `const` next to the handler it protects.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldGuard {
    permission: Option<&'static str>,
}

impl FieldGuard {
    /// Require only an authenticated principal.
    pub const fn authenticated() -> Self {
        Self { permission: None }
    }

    pub const fn requiring(permission: &'static str) -> Self {
        Self {
            permission: Some(permission),
        }
    }

    /// Authorize the call, then run `resolver` with the resolved identity.
    ///
    /// # What it does
    /// Runs [`FieldGuard::authorize`]; on success hands the identity to
    /// `resolver` and returns its result. Denials increment
    /// `keel_authz_denied_total{adapter="field_guard"}`.
    ///
    /// # Errors
    /// - The generic forbidden `ApiError` on any authorization failure;
    ///   `resolver` is not called.
    /// - A 500 `ApiError` when the identity store fails.
    /// - Whatever `resolver` returns.
    pub async fn resolve<T, F, Fut>(
        &self,
        state: &AppState,
        headers: &HeaderMap,
        args: &GuardArgs,
        resolver: F,
    ) -> Result<T, ApiError>
    where
        F: FnOnce(ResolverContext) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let identity = match self.authorize(state, headers, args).await {
            Ok(identity) => identity,
            Err(err) => {
                metrics::counter!("keel_authz_denied_total", "adapter" => "field_guard")
                    .increment(1);
                return Err(err);
            }
        };
        tracing::debug!(
            principal = identity.id(),
            permission = self.permission.unwrap_or("-"),
            "executing authenticated request"
        );
        resolver(ResolverContext { identity }).await
    }

    /// Resolve the caller and check the permission against the call's ids.
    ///
    /// # What it does
    /// Reads the credential from the headers, resolves it through the shared
    /// `Authenticator`, then checks the workspace id and the deployment id
    /// independently when present.
    ///
    /// # Errors
    /// - Forbidden when there is no credential, the principal is unknown, or
    ///   either entity check fails.
    /// - A 500 `ApiError` when the identity store fails.
    pub async fn authorize(
        &self,
        state: &AppState,
        headers: &HeaderMap,
        args: &GuardArgs,
    ) -> Result<Identity, ApiError> {
        let credential = extract_credential(headers, &state.auth_cookie_name)
            .ok_or(AuthzError::Unauthenticated)?;
        let identity = state
            .authenticator
            .authenticate(&credential)
            .await
            .map_err(|err| api_internal("failed to resolve identity", &err))?
            .ok_or(AuthzError::NotFound)?;

        if let Some(permission) = self.permission {
            if let Some(workspace_id) = args.workspace_id.as_deref() {
                state.evaluator.check_permission(
                    Some(&identity),
                    permission,
                    Some(EntityType::Workspace),
                    Some(workspace_id),
                )?;
            }
            if let Some(deployment_id) = args.deployment_id.as_deref() {
                state.evaluator.check_permission(
                    Some(&identity),
                    permission,
                    Some(EntityType::Deployment),
                    Some(deployment_id),
                )?;
            }
        }
        Ok(identity)
    }
}
