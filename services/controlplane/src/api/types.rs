//! HTTP API request/response types.
use crate::model::DeploymentRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeploymentListResponse {
    pub items: Vec<DeploymentRecord>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessibleDeploymentsResponse {
    pub permission: String,
    pub deployment_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserSummary {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserListResponse {
    pub items: Vec<UserSummary>,
}
