#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use axum::http::header::{AUTHORIZATION, COOKIE};
use chrono::Utc;
use controlplane::app::{AppState, build_router};
use controlplane::model::{DeploymentRecord, ServiceAccountRecord, UserRecord};
use controlplane::store::memory::InMemoryStore;
use keel_authz::{RoleBinding, RoleCatalog, TokenIssuer, TokenVerifier};
use std::sync::Arc;
use std::time::Duration;

pub const SECRET: &[u8] = b"integration-passphrase";
pub const COOKIE_NAME: &str = "keel_auth";
pub const SERVICE_ACCOUNT_KEY: &str = "sk0123456789abcdefghijklmnopqrst";

pub type TestApp = axum::routing::RouterIntoService<Body, ()>;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub async fn read_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body")
        .to_vec()
}

/// Users:
/// - `admin`: SYSTEM_ADMIN
/// - `ws-admin`: WORKSPACE_ADMIN on `w1`
/// - `viewer`: USER plus DEPLOYMENT_VIEWER on `d2`
/// - `plain`: USER only
///
/// Deployments: `d1` and `d3` (deleted) in `w1`, `d2` in `w2`.
/// The service account holds WORKSPACE_VIEWER on `w1`.
pub async fn fixture_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    let users = [
        ("admin", vec![RoleBinding::global("SYSTEM_ADMIN")]),
        ("ws-admin", vec![RoleBinding::workspace("WORKSPACE_ADMIN", "w1")]),
        (
            "viewer",
            vec![
                RoleBinding::global("USER"),
                RoleBinding::deployment("DEPLOYMENT_VIEWER", "d2"),
            ],
        ),
        ("plain", vec![RoleBinding::global("USER")]),
    ];
    for (id, role_bindings) in users {
        store
            .insert_user(UserRecord {
                id: id.to_string(),
                role_bindings,
            })
            .await
            .expect("user");
    }
    store
        .insert_service_account(ServiceAccountRecord {
            id: "sa-1".to_string(),
            api_key: SERVICE_ACCOUNT_KEY.to_string(),
            role_binding: RoleBinding::workspace("WORKSPACE_VIEWER", "w1"),
        })
        .await
        .expect("service account");
    for (id, workspace_id) in [("d1", "w1"), ("d2", "w2"), ("d3", "w1")] {
        store
            .insert_deployment(DeploymentRecord::new(id, workspace_id))
            .await
            .expect("deployment");
    }
    store
        .soft_delete_deployment("d3", Utc::now())
        .await
        .expect("delete");
    store
}

pub async fn app() -> TestApp {
    app_with_store(fixture_store().await)
}

pub fn app_with_store(store: Arc<InMemoryStore>) -> TestApp {
    let state = AppState::new(
        store,
        Arc::new(RoleCatalog::builtin().expect("catalog")),
        Arc::new(TokenVerifier::new(SECRET, 0)),
        COOKIE_NAME,
    );
    build_router(state).into_service()
}

pub fn token_for(user_id: &str) -> String {
    TokenIssuer::new(SECRET, Duration::from_secs(300))
        .mint(user_id)
        .expect("mint")
}

pub fn anonymous(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn with_bearer(uri: &str, credential: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {credential}"))
        .body(Body::empty())
        .expect("request")
}

pub fn with_cookie(uri: &str, credential: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(COOKIE, format!("theme=dark; {COOKIE_NAME}={credential}"))
        .body(Body::empty())
        .expect("request")
}

pub fn as_user(uri: &str, user_id: &str) -> Request<Body> {
    with_bearer(uri, &token_for(user_id))
}
