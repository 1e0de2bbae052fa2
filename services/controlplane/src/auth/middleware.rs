//! Request authentication middleware.
//!
//! # Purpose
//! Attaches a [`Session`] to every inbound request. The session carries the
//! resolved identity, nothing, or the fact that the identity store could not
//! be reached. This layer never rejects a request; handlers decide whether an
//! absent identity is fatal, and report a failed lookup as an internal error.
use crate::api::error::{ApiError, api_internal_message};
use crate::app::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::middleware::Next;
use axum::response::Response;
use keel_authz::Identity;

/// Per-request authentication outcome stored in request extensions.
///
/// # Invariants
/// - `lookup_failed` implies `identity` is `None`.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub identity: Option<Identity>,
    pub lookup_failed: bool,
}

impl Session {
    pub fn authenticated(identity: Option<Identity>) -> Self {
        Self {
            identity,
            lookup_failed: false,
        }
    }

    pub fn failed() -> Self {
        Self {
            identity: None,
            lookup_failed: true,
        }
    }

    /// Identity for the request, if any.
    ///
    /// # Errors
    /// - Returns a 500 `ApiError` when the identity store failed during
    ///   authentication, so an outage is never reported as a denial.
    pub fn identity(&self) -> Result<Option<&Identity>, ApiError> {
        if self.lookup_failed {
            return Err(api_internal_message("failed to resolve identity"));
        }
        Ok(self.identity.as_ref())
    }
}

/// Pull the raw credential from `Authorization` (with or without a `Bearer `
/// prefix), falling back to the named cookie.
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
        .filter(|value| !value.is_empty());
    if let Some(token) = from_header {
        return Some(token.to_string());
    }
    cookie_value(headers, cookie_name)
}

fn cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub async fn authenticate_request(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(Session::default());

    let session = match extract_credential(request.headers(), &state.auth_cookie_name) {
        Some(credential) => match state.authenticator.authenticate(&credential).await {
            Ok(identity) => Session::authenticated(identity),
            Err(err) => {
                tracing::warn!(error = %err, "identity lookup failed");
                Session::failed()
            }
        },
        None => Session::default(),
    };

    let result = match &session.identity {
        Some(Identity::User(_)) => "user",
        Some(Identity::ServiceAccount(_)) => "service_account",
        None if session.lookup_failed => "error",
        None => "anonymous",
    };
    metrics::counter!("keel_authn_total", "result" => result).increment(1);

    request.extensions_mut().insert(session);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        headers.insert(COOKIE, HeaderValue::from_static("keel_auth=cookie-token"));
        assert_eq!(
            extract_credential(&headers, "keel_auth").as_deref(),
            Some("header-token")
        );
    }

    #[test]
    fn bare_header_value_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("opaque-key"));
        assert_eq!(
            extract_credential(&headers, "keel_auth").as_deref(),
            Some("opaque-key")
        );
    }

    #[test]
    fn falls_back_to_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; keel_auth=cookie-token; other=1"),
        );
        assert_eq!(
            extract_credential(&headers, "keel_auth").as_deref(),
            Some("cookie-token")
        );
        assert_eq!(extract_credential(&headers, "missing"), None);
    }

    #[test]
    fn nothing_yields_none() {
        assert_eq!(extract_credential(&HeaderMap::new(), "keel_auth"), None);
    }

    #[test]
    fn failed_session_surfaces_internal_error() {
        let err = Session::failed().identity().expect_err("lookup failed");
        assert_eq!(err.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(Session::default().identity().expect("ok").is_none());
    }
}
