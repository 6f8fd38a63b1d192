//! Shared-secret header auth, used identically by the central controller
//! and the keypad controller's inbound HTTP surfaces.
//!
//! Grounded on the teacher's `transport::auth` bearer-token middleware;
//! adapted from an `Authorization: Bearer` header to the plain
//! `authorisationKey` header this system's wire protocol specifies.

use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

pub const AUTH_HEADER: &str = "authorisationKey";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    Missing,
    Mismatch,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Missing => StatusCode::UNAUTHORIZED,
            Self::Mismatch => StatusCode::FORBIDDEN,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::Missing => "Authorisation key is missing",
            Self::Mismatch => "Authorisation key is incorrect",
        }
    }
}

/// Constant-time string comparison to avoid leaking key length/content via timing.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

/// Validate the `authorisationKey` header against the configured secret.
pub fn validate_auth_key(headers: &HeaderMap, expected: &str) -> Result<(), AuthError> {
    let header = headers.get(AUTH_HEADER).and_then(|v| v.to_str().ok()).ok_or(AuthError::Missing)?;
    if constant_time_eq(header, expected) {
        Ok(())
    } else {
        Err(AuthError::Mismatch)
    }
}

/// Trait implemented by each service's shared state so the middleware can
/// be generic over `cencon`/`keypad` state types.
pub trait HasAuthKey {
    fn auth_key(&self) -> &str;
}

/// Axum middleware enforcing `authorisationKey` on every route it is layered
/// over. The `_health_status` endpoint is still routed through this in both
/// services per spec (§4.6/§4.7.2 list it as requiring auth).
pub async fn auth_layer<S>(
    state: State<std::sync::Arc<S>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response
where
    S: HasAuthKey + Send + Sync + 'static,
{
    if let Err(err) = validate_auth_key(req.headers(), state.auth_key()) {
        return (err.status(), err.reason()).into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_is_unauthorized() {
        let headers = HeaderMap::new();
        assert_eq!(validate_auth_key(&headers, "secret"), Err(AuthError::Missing));
    }

    #[test]
    fn mismatched_header_is_forbidden() -> anyhow::Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_HEADER, "wrong".parse()?);
        assert_eq!(validate_auth_key(&headers, "secret"), Err(AuthError::Mismatch));
        Ok(())
    }

    #[test]
    fn matching_header_is_accepted() -> anyhow::Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_HEADER, "secret".parse()?);
        assert_eq!(validate_auth_key(&headers, "secret"), Ok(()));
        Ok(())
    }
}
