//! Identity resolution from credentials.
//!
//! # Purpose and responsibility
//! Resolves a raw credential into a user or service-account identity with its
//! stored role bindings. Authentication failure is represented as `None`;
//! whether that is fatal is the caller's decision.
//!
//! # Key invariants and assumptions
//! - Empty credentials never reach the store.
//! - Unverifiable tokens never reach the store.
//! - Store failures propagate unchanged; they are not authentication results.
use crate::auth::synthesize::BindingSynthesizer;
use crate::store::{IdentityStore, StoreResult};
use keel_authz::{Credential, Identity, TokenVerifier, classify};
use std::sync::Arc;

/// Resolves credentials into identities using the store.
#[derive(Clone)]
pub struct IdentityLoader {
    store: Arc<dyn IdentityStore>,
    verifier: Arc<TokenVerifier>,
}

impl IdentityLoader {
    pub fn new(store: Arc<dyn IdentityStore>, verifier: Arc<TokenVerifier>) -> Self {
        Self { store, verifier }
    }

    /// Load a user and its stored role bindings.
    ///
    /// # Errors
    /// - Propagates `StoreError` from the store; an unknown id is `Ok(None)`.
    pub async fn load_user(&self, user_id: &str) -> StoreResult<Option<Identity>> {
        let user = self.store.user_with_role_bindings(user_id).await?;
        Ok(user.map(Identity::from))
    }

    /// Look up a service account by exact key; its single binding becomes a
    /// one-element binding list.
    ///
    /// # Errors
    /// - Propagates `StoreError`; an unknown key is `Ok(None)`.
    pub async fn load_service_account(&self, api_key: &str) -> StoreResult<Option<Identity>> {
        let account = self.store.service_account_by_key(api_key).await?;
        Ok(account.map(Identity::from))
    }

    /// Classify and resolve a raw credential.
    ///
    /// # What it does
    /// Opaque keys go to [`IdentityLoader::load_service_account`]; signed
    /// tokens are verified and their `uuid` claim goes to
    /// [`IdentityLoader::load_user`]. Empty credentials, unverifiable tokens,
    /// and tokens with an empty subject resolve to `Ok(None)` without a
    /// store call.
    ///
    /// # Errors
    /// - Propagates `StoreError` from the lookup.
    pub async fn resolve(&self, credential: &str) -> StoreResult<Option<Identity>> {
        match classify(credential) {
            None => Ok(None),
            Some(Credential::ServiceAccountKey(api_key)) => {
                self.load_service_account(api_key).await
            }
            Some(Credential::Signed(token)) => match self.verifier.verify(token) {
                Some(claims) if !claims.uuid.is_empty() => self.load_user(&claims.uuid).await,
                _ => Ok(None),
            },
        }
    }
}

/// Single entry point both enforcement adapters use: resolve, then add the
/// synthesized deployment bindings.
#[derive(Clone)]
pub struct Authenticator {
    loader: IdentityLoader,
    synthesizer: BindingSynthesizer,
}

impl Authenticator {
    pub fn new(loader: IdentityLoader, synthesizer: BindingSynthesizer) -> Self {
        Self {
            loader,
            synthesizer,
        }
    }

    /// Resolve the credential and append synthesized deployment bindings.
    ///
    /// # Errors
    /// - Propagates `StoreError` from either the identity lookup or the
    ///   deployment query.
    pub async fn authenticate(&self, credential: &str) -> StoreResult<Option<Identity>> {
        let identity = self.loader.resolve(credential).await?;
        self.synthesizer.add_deployment_role_bindings(identity).await
    }
}
