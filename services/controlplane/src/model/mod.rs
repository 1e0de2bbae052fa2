//! Control-plane data model module.
//!
//! # Purpose
//! Re-exports the user, service-account, and deployment records exchanged
//! between the store and the auth layer.
mod deployment;
mod service_account;
mod user;

pub use deployment::DeploymentRecord;
pub use service_account::ServiceAccountRecord;
pub use user::UserRecord;
