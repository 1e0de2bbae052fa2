//! Identity-facing API handlers backed by the middleware session.
use crate::api::error::{ApiError, api_internal};
use crate::api::types::{UserListResponse, UserSummary};
use crate::app::AppState;
use crate::auth::middleware::Session;
use axum::extract::State;
use axum::{Extension, Json};
use keel_authz::{AuthzError, Identity, PERM_SYSTEM_USERS_GET};

/// Return the caller's identity, including synthesized bindings.
pub(crate) async fn self_identity(
    Extension(session): Extension<Session>,
) -> Result<Json<Identity>, ApiError> {
    let identity = session.identity()?.ok_or(AuthzError::Unauthenticated)?;
    Ok(Json(identity.clone()))
}

pub(crate) async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<UserListResponse>, ApiError> {
    state
        .evaluator
        .check_system_permission(session.identity()?, PERM_SYSTEM_USERS_GET)?;
    let users = state
        .store
        .list_users()
        .await
        .map_err(|err| api_internal("failed to list users", &err))?;
    Ok(Json(UserListResponse {
        items: users
            .into_iter()
            .map(|user| UserSummary { id: user.id })
            .collect(),
    }))
}
