//! Keel control-plane HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, the role catalog, the identity store, and the HTTP
//! router, then serves the API and the metrics endpoint until shutdown.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use controlplane::app::{AppState, build_router};
use controlplane::config::ControlPlaneConfig;
use controlplane::observability;
use controlplane::store::IdentityStore;
use controlplane::store::memory::{InMemoryStore, SeedData};
use keel_authz::TokenVerifier;
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ControlPlaneConfig::from_env_or_yaml().context("control plane config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: ControlPlaneConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("keel-controlplane")?;
    let state = build_state(&config).await?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);

    let addr = config.bind_addr;
    tracing::info!(%addr, "control plane listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

async fn build_state(config: &ControlPlaneConfig) -> anyhow::Result<AppState> {
    let catalog = config.load_role_catalog()?;
    tracing::info!(roles = catalog.len(), "role catalog loaded");

    let seed = match &config.seed_file {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("read seed file: {}", path.display()))?;
            serde_yaml::from_str::<SeedData>(&contents)
                .with_context(|| format!("parse seed file: {}", path.display()))?
        }
        None => SeedData::default(),
    };
    let store: Arc<dyn IdentityStore> = Arc::new(
        InMemoryStore::from_seed(seed)
            .await
            .context("seed identity store")?,
    );
    tracing::info!(backend = store.backend_name(), "identity store ready");

    Ok(AppState::new(
        store,
        Arc::new(catalog),
        Arc::new(TokenVerifier::new(
            config.jwt_passphrase.as_bytes(),
            config.jwt_leeway_secs,
        )),
        config.auth_cookie_name.clone(),
    ))
}
