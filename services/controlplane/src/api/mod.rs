//! Control-plane HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules. Deployment routes are guarded per operation
//! with [`FieldGuard`](crate::auth::guard::FieldGuard); identity routes read
//! the session attached by the authentication middleware.
pub mod deployments;
pub mod error;
pub mod system;
pub mod types;
pub mod users;
