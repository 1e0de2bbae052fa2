//! Credential classification and signed-token handling.
//!
//! # Purpose
//! Decides whether an inbound credential is an opaque service-account key or
//! a signed user token, and verifies/mints the latter.
//!
//! # Key invariants
//! - Service-account keys are exactly 32 characters and contain no `.`.
//! - User tokens are HS256 JWTs signed with the configured passphrase.
//! - Verification never fails loudly: bad signature, malformed input, and
//!   expiry all yield `None`.
//!
//! # Security considerations
//! - The passphrase is held only as encoding/decoding keys and is never
//!   logged.
use crate::errors::AuthzResult;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const SERVICE_ACCOUNT_KEY_LEN: usize = 32;

/// Claims carried by user tokens. `uuid` is the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub uuid: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    ServiceAccountKey(&'a str),
    Signed(&'a str),
}

/// Whether a credential looks like a service-account API key.
pub fn is_service_account(credential: &str) -> bool {
    credential.chars().count() == SERVICE_ACCOUNT_KEY_LEN && !credential.contains('.')
}

/// Classify a raw credential. Empty input is no credential at all.
pub fn classify(credential: &str) -> Option<Credential<'_>> {
    if credential.is_empty() {
        return None;
    }
    if is_service_account(credential) {
        Some(Credential::ServiceAccountKey(credential))
    } else {
        Some(Credential::Signed(credential))
    }
}

pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(passphrase: &[u8], leeway: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway;
        Self {
            decoding_key: DecodingKey::from_secret(passphrase),
            validation,
        }
    }

    /// Verify signature and expiry. Any failure is reported as `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                tracing::debug!(error = %err, "token verification failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(passphrase: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(passphrase),
            ttl,
        }
    }

    pub fn mint(&self, user_id: &str) -> AuthzResult<String> {
        let now = now_epoch_seconds();
        let claims = Claims {
            uuid: user_id.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };
        self.encode(&claims)
    }

    /// Sign arbitrary claims, including already-expired ones.
    pub fn encode(&self, claims: &Claims) -> AuthzResult<String> {
        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?;
        Ok(token)
    }
}

fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs() as i64
}
