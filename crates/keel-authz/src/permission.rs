use serde::{Deserialize, Serialize};

/// Leading segment of global permissions (`system.iam.update`).
pub const SYSTEM_PREFIX: &str = "system";

/// Role keys starting with this token are bound to a workspace.
pub const ROLE_CLASS_WORKSPACE: &str = "WORKSPACE";
/// Role keys starting with this token are bound to a deployment.
pub const ROLE_CLASS_DEPLOYMENT: &str = "DEPLOYMENT";

pub const PERM_SYSTEM_USERS_GET: &str = "system.users.get";
pub const PERM_WORKSPACE_DEPLOYMENTS_GET: &str = "workspace.deployments.get";
pub const PERM_DEPLOYMENT_CONFIG_GET: &str = "deployment.config.get";
pub const PERM_DEPLOYMENT_LOGS_READ: &str = "deployment.logs.read";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Workspace,
    Deployment,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Workspace => "workspace",
            EntityType::Deployment => "deployment",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "workspace" => Ok(EntityType::Workspace),
            "deployment" => Ok(EntityType::Deployment),
            _ => Err(()),
        }
    }
}

/// Whether `permission` is global, i.e. its first dotted segment is `system`.
pub fn is_system_permission(permission: &str) -> bool {
    permission.split('.').next() == Some(SYSTEM_PREFIX)
}

pub fn is_workspace_role(role: &str) -> bool {
    role.starts_with(ROLE_CLASS_WORKSPACE)
}

/// Rewrite a workspace-class role key into its deployment-class twin
/// (`WORKSPACE_ADMIN` -> `DEPLOYMENT_ADMIN`). Only the first occurrence of the
/// class token is replaced.
pub fn deployment_role_for(workspace_role: &str) -> String {
    workspace_role.replacen(ROLE_CLASS_WORKSPACE, ROLE_CLASS_DEPLOYMENT, 1)
}
