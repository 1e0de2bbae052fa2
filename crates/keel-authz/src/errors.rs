use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("no verifiable identity")]
    Unauthenticated,
    #[error("principal not found")]
    NotFound,
    #[error("permission denied: {0}")]
    Forbidden(String),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("invalid roles config: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl AuthzError {
    /// True for the variants a caller must report as a generic "forbidden".
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            AuthzError::Unauthenticated | AuthzError::NotFound | AuthzError::Forbidden(_)
        )
    }
}

pub type AuthzResult<T> = Result<T, AuthzError>;
