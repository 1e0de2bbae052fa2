mod common;

use axum::http::StatusCode;
use common::{
    SERVICE_ACCOUNT_KEY, anonymous, app, app_with_store, as_user, fixture_store, read_bytes,
    read_json, with_bearer,
};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn workspace_admin_reaches_deployments_of_its_workspace() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(as_user("/v1/deployments/d1", "ws-admin"))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({"id": "d1", "workspace_id": "w1", "deleted_at": null})
    );

    let response = app
        .oneshot(as_user("/v1/deployments/d2", "ws-admin"))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleted_deployment_is_not_granted_through_workspace() {
    let response = app()
        .await
        .oneshot(as_user("/v1/deployments/d3", "ws-admin"))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn direct_deployment_binding_is_honored() {
    let response = app()
        .await
        .oneshot(as_user("/v1/deployments/d2", "viewer"))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["workspace_id"], "w2");
}

#[tokio::test]
async fn service_account_key_passes_the_guard() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(with_bearer("/v1/deployments/d1", SERVICE_ACCOUNT_KEY))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(with_bearer("/v1/workspaces/w1/deployments", SERVICE_ACCOUNT_KEY))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn workspace_listing_is_guarded_by_workspace_permission() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(as_user("/v1/workspaces/w1/deployments", "ws-admin"))
        .await
        .expect("list");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({"items": [{"id": "d1", "workspace_id": "w1", "deleted_at": null}]})
    );

    for request in [
        as_user("/v1/workspaces/w2/deployments", "ws-admin"),
        as_user("/v1/workspaces/w1/deployments", "plain"),
        as_user("/v1/workspaces/w1/deployments", "admin"),
    ] {
        let response = app.clone().oneshot(request).await.expect("list");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn every_denial_renders_identical_bytes() {
    let app = app().await;
    let requests = [
        anonymous("/v1/workspaces/w1/deployments"),
        as_user("/v1/workspaces/w1/deployments", "ghost"),
        as_user("/v1/workspaces/w1/deployments", "plain"),
        with_bearer("/v1/workspaces/w1/deployments", "not.a.token"),
        with_bearer("/v1/deployments/d1", &"x".repeat(32)),
        anonymous("/v1/self"),
        as_user("/v1/users", "plain"),
    ];

    let mut bodies = Vec::new();
    for request in requests {
        let response = app.clone().oneshot(request).await.expect("request");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        bodies.push(read_bytes(response).await);
    }
    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn each_identity_resolution_issues_one_deployment_query() {
    let store = fixture_store().await;
    let app = app_with_store(store.clone());
    let before = store.deployment_query_count();

    let response = app
        .oneshot(as_user("/v1/deployments/d1", "ws-admin"))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::OK);

    // The middleware session and the guard each resolve the identity once.
    assert_eq!(store.deployment_query_count() - before, 2);
}
