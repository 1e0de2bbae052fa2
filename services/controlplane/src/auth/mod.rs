//! Control-plane authentication and authorization modules.
//!
//! # Purpose
//! Turns an inbound credential into an identity with its effective role
//! bindings, and enforces permissions at the HTTP boundary.
//!
//! # Flow
//! credential -> [`identity::IdentityLoader`] (store) ->
//! [`synthesize::BindingSynthesizer`] (one batched store read) -> identity ->
//! `keel_authz::PermissionEvaluator`, consulted by [`middleware`] and
//! [`guard`].
pub mod guard;
pub mod identity;
pub mod middleware;
pub mod synthesize;
