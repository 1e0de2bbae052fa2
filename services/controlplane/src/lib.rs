//! Control-plane service library crate.
//!
//! # Purpose
//! Exposes the HTTP API surface, identity resolution, enforcement adapters,
//! configuration, and the store contract for use by the binary and tests.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod observability;
pub mod store;
