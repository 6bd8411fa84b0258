//! Admin authorization.
//!
//! Admin endpoints carry a bearer token checked against `ADMIN_TOKEN`.
//! The check is an explicit per-request capability gate; with no token
//! configured the admin surface is disabled outright.

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use crate::config::ServerConfig;
use crate::error::ApiError;

/// Verify the `Authorization: Bearer` header against the configured
/// admin token.
pub fn require_admin(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ApiError> {
    let Some(ref expected) = config.admin_token else {
        return Err(ApiError::Forbidden(
            "Admin API is disabled (no ADMIN_TOKEN configured)".into(),
        ));
    };

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or(auth);

    // Constant-time comparison to prevent timing attacks on the token.
    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ApiError::Forbidden("Invalid admin token".into()));
    }

    Ok(())
}
