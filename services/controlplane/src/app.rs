//! Control-plane HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, installs the authentication middleware, and
//! defines the shared application state injected into handlers.
//!
//! # Notes
//! The role catalog is constructed once at startup and handed to the
//! evaluator here; nothing writes to it afterwards.
use crate::api;
use crate::auth::identity::{Authenticator, IdentityLoader};
use crate::auth::middleware::authenticate_request;
use crate::auth::synthesize::BindingSynthesizer;
use crate::store::IdentityStore;
use axum::Router;
use keel_authz::{PermissionEvaluator, RoleCatalog, TokenVerifier};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IdentityStore>,
    pub authenticator: Authenticator,
    pub evaluator: PermissionEvaluator,
    pub auth_cookie_name: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        catalog: Arc<RoleCatalog>,
        verifier: Arc<TokenVerifier>,
        auth_cookie_name: impl Into<String>,
    ) -> Self {
        let loader = IdentityLoader::new(store.clone(), verifier);
        let synthesizer = BindingSynthesizer::new(store.clone());
        Self {
            store,
            authenticator: Authenticator::new(loader, synthesizer),
            evaluator: PermissionEvaluator::new(catalog),
            auth_cookie_name: auth_cookie_name.into(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            )
        });

    Router::new()
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route("/v1/self", axum::routing::get(api::users::self_identity))
        .route("/v1/users", axum::routing::get(api::users::list_users))
        .route(
            "/v1/deployments",
            axum::routing::get(api::deployments::list_accessible_deployments),
        )
        .route(
            "/v1/deployments/:deployment_id",
            axum::routing::get(api::deployments::get_deployment),
        )
        .route(
            "/v1/workspaces/:workspace_id/deployments",
            axum::routing::get(api::deployments::list_workspace_deployments),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            authenticate_request,
        ))
        .layer(trace_layer)
        .with_state(state)
}
