//! Deployment API handlers.
//!
//! Each handler is wrapped by a [`FieldGuard`] naming the permission it needs;
//! the guard checks it against the workspace or deployment in the path before
//! the handler body runs.
use crate::api::error::{ApiError, api_internal, api_not_found};
use crate::api::types::{AccessibleDeploymentsResponse, DeploymentListResponse};
use crate::app::AppState;
use crate::auth::guard::{FieldGuard, GuardArgs};
use crate::auth::middleware::Session;
use crate::model::DeploymentRecord;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use keel_authz::{AuthzError, PERM_DEPLOYMENT_CONFIG_GET, PERM_WORKSPACE_DEPLOYMENTS_GET};

const LIST_WORKSPACE_DEPLOYMENTS: FieldGuard =
    FieldGuard::requiring(PERM_WORKSPACE_DEPLOYMENTS_GET);
const GET_DEPLOYMENT: FieldGuard = FieldGuard::requiring(PERM_DEPLOYMENT_CONFIG_GET);

pub(crate) async fn list_workspace_deployments(
    Path(workspace_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DeploymentListResponse>, ApiError> {
    let store = state.store.clone();
    let args = GuardArgs::workspace(workspace_id.clone());
    LIST_WORKSPACE_DEPLOYMENTS
        .resolve(&state, &headers, &args, |_ctx| async move {
            let items = store
                .active_deployments_in_workspaces(&[workspace_id])
                .await
                .map_err(|err| api_internal("failed to list deployments", &err))?;
            Ok::<_, ApiError>(Json(DeploymentListResponse { items }))
        })
        .await
}

pub(crate) async fn get_deployment(
    Path(deployment_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DeploymentRecord>, ApiError> {
    let store = state.store.clone();
    let args = GuardArgs::deployment(deployment_id.clone());
    GET_DEPLOYMENT
        .resolve(&state, &headers, &args, |_ctx| async move {
            let deployment = store
                .deployment(&deployment_id)
                .await
                .map_err(|err| api_internal("failed to load deployment", &err))?
                .ok_or_else(|| api_not_found("deployment not found"))?;
            Ok::<_, ApiError>(Json(deployment))
        })
        .await
}

/// List the deployment ids the session identity can read.
pub(crate) async fn list_accessible_deployments(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<AccessibleDeploymentsResponse>, ApiError> {
    let identity = session.identity()?.ok_or(AuthzError::Unauthenticated)?;
    let deployment_ids = state
        .evaluator
        .accessible_deployments_with_permission(Some(identity), PERM_DEPLOYMENT_CONFIG_GET);
    Ok(Json(AccessibleDeploymentsResponse {
        permission: PERM_DEPLOYMENT_CONFIG_GET.to_string(),
        deployment_ids,
    }))
}
