use anyhow::{Context, Result, ensure};
use keel_authz::RoleCatalog;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_AUTH_COOKIE: &str = "keel_auth";

// Control plane configuration sourced from environment variables.
#[derive(Clone)]
pub struct ControlPlaneConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub jwt_passphrase: String,
    pub jwt_leeway_secs: u64,
    pub auth_cookie_name: String,
    pub roles_file: Option<PathBuf>,
    pub seed_file: Option<PathBuf>,
}

impl std::fmt::Debug for ControlPlaneConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPlaneConfig")
            .field("bind_addr", &self.bind_addr)
            .field("metrics_bind", &self.metrics_bind)
            .field("jwt_passphrase", &"<redacted>")
            .field("jwt_leeway_secs", &self.jwt_leeway_secs)
            .field("auth_cookie_name", &self.auth_cookie_name)
            .field("roles_file", &self.roles_file)
            .field("seed_file", &self.seed_file)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ControlPlaneConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    jwt_passphrase: Option<String>,
    jwt_leeway_secs: Option<u64>,
    auth_cookie_name: Option<String>,
    roles_file: Option<PathBuf>,
    seed_file: Option<PathBuf>,
}

impl ControlPlaneConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("KEEL_CP_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8871".to_string())
            .parse()
            .with_context(|| "parse KEEL_CP_BIND")?;
        let metrics_bind = std::env::var("KEEL_CP_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8872".to_string())
            .parse()
            .with_context(|| "parse KEEL_CP_METRICS_BIND")?;
        let jwt_passphrase = std::env::var("KEEL_JWT_PASSPHRASE").unwrap_or_default();
        let jwt_leeway_secs = match std::env::var("KEEL_JWT_LEEWAY_SECS") {
            Ok(value) => value
                .parse()
                .with_context(|| "parse KEEL_JWT_LEEWAY_SECS")?,
            Err(_) => 0,
        };
        let auth_cookie_name = std::env::var("KEEL_AUTH_COOKIE")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_AUTH_COOKIE.to_string());
        let roles_file = std::env::var("KEEL_ROLES_FILE").ok().map(PathBuf::from);
        let seed_file = std::env::var("KEEL_SEED_FILE").ok().map(PathBuf::from);
        Ok(Self {
            bind_addr,
            metrics_bind,
            jwt_passphrase,
            jwt_leeway_secs,
            auth_cookie_name,
            roles_file,
            seed_file,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("KEEL_CP_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read KEEL_CP_CONFIG: {path}"))?;
            let override_cfg: ControlPlaneConfigOverride = serde_yaml::from_str(&contents)
                .with_context(|| "parse control plane config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.jwt_passphrase {
                config.jwt_passphrase = value;
            }
            if let Some(value) = override_cfg.jwt_leeway_secs {
                config.jwt_leeway_secs = value;
            }
            if let Some(value) = override_cfg.auth_cookie_name {
                config.auth_cookie_name = value;
            }
            if let Some(value) = override_cfg.roles_file {
                config.roles_file = Some(value);
            }
            if let Some(value) = override_cfg.seed_file {
                config.seed_file = Some(value);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.jwt_passphrase.is_empty(),
            "KEEL_JWT_PASSPHRASE must be set"
        );
        ensure!(
            !self.auth_cookie_name.is_empty(),
            "auth cookie name must not be empty"
        );
        Ok(())
    }

    /// Load the role catalog from `roles_file`, or the built-in roles.
    pub fn load_role_catalog(&self) -> Result<RoleCatalog> {
        match &self.roles_file {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("read roles file: {}", path.display()))?;
                RoleCatalog::from_yaml_str(&contents)
                    .with_context(|| format!("parse roles file: {}", path.display()))
            }
            None => RoleCatalog::builtin().with_context(|| "parse built-in roles"),
        }
    }
}
