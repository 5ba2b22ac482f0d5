//! HTTP Basic authentication middleware. Delegates the actual credential check to the injected
//! [`scanner_core::AuthVerifier`] collaborator; this module only handles the `Authorization` header
//! parsing and the axum wiring, keeping transport-layer concerns separate from pluggable backends.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;

use crate::error::HttpError;
use crate::state::AppState;

/// Attached to the request extensions on a successful auth check so handlers (e.g. `/health`) can
/// report back who authenticated.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

/// `axum::middleware::from_fn_with_state` layer enforcing Basic auth on every route it wraps.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(HttpError::Unauthenticated)?;

    let (username, password) = parse_basic_auth(header).ok_or(HttpError::Unauthenticated)?;

    if !state.auth_verifier.verify(&username, &password).await {
        return Err(HttpError::Unauthenticated);
    }

    request.extensions_mut().insert(AuthenticatedUser(username));
    Ok(next.run(request).await)
}

/// Parses an `Authorization: Basic <base64(user:pass)>` header value.
fn parse_basic_auth(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_header() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("admin:hunter2");
        let header = format!("Basic {encoded}");
        let (user, pass) = parse_basic_auth(&header).unwrap();
        assert_eq!(user, "admin");
        assert_eq!(pass, "hunter2");
    }

    #[test]
    fn rejects_non_basic_scheme() {
        assert!(parse_basic_auth("Bearer abc123").is_none());
    }

    #[test]
    fn rejects_malformed_base64() {
        assert!(parse_basic_auth("Basic not-valid-base64!!").is_none());
    }
}
