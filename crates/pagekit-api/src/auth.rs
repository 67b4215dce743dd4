//! # Request Authentication
//!
//! Derives the acting identity for a request and enforces the anti-forgery
//! precondition on mutating routes.
//!
//! - `Authorization: Bearer <token>` resolves a registered account; an
//!   unknown token is rejected rather than silently downgraded.
//! - `X-Session-Token: <token>` derives an anonymous pseudo-identity. The
//!   token never leaves the server; responses only ever carry the pseudo-id.
//! - Neither header → rejected; every caller must have a session of some kind.

use axum::http::HeaderMap;

use pagekit_core::ActorContext;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the anonymous session token.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";
/// Anti-forgery header required on mutating routes.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Resolve the acting identity from request headers.
pub fn actor_from_headers(state: &AppState, headers: &HeaderMap) -> Result<ActorContext, AppError> {
    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AppError::Unauthorized("Malformed Authorization header.".to_string()))?;
        let token = value.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Only Bearer authorization is supported.".to_string())
        })?;
        let accounts = state.accounts.read();
        let account = accounts
            .get(token)
            .ok_or_else(|| AppError::Unauthorized("Unknown access token.".to_string()))?;
        let mut actor =
            ActorContext::authenticated(&account.id, &account.name, account.permissions.clone());
        actor.avatar = account.avatar.clone();
        actor.uri = account.uri.clone();
        return Ok(actor);
    }

    if let Some(value) = headers.get(SESSION_TOKEN_HEADER) {
        let token = value
            .to_str()
            .map_err(|_| AppError::Unauthorized("Malformed session token.".to_string()))?;
        return Ok(ActorContext::anonymous(token));
    }

    Err(AppError::Unauthorized(
        "No credentials or session token provided.".to_string(),
    ))
}

/// Enforce the anti-forgery token on a mutating request.
pub fn require_csrf(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let valid = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == state.config.csrf_token);
    if valid {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "X-CSRF-Token request header is missing or invalid.".to_string(),
        ))
    }
}
