// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed session cookie and the middleware that resolves it.

use crate::error::AppError;
use crate::models::SessionRecord;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the single session cookie.
pub const SESSION_COOKIE: &str = "strava_session";

/// JWT claims carried by the session cookie.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Opaque session ID (key into the session store)
    pub sid: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Session resolved from a request's cookie.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub session_id: String,
    pub record: SessionRecord,
}

/// Create the signed session cookie value.
pub fn create_session_jwt(
    session_id: &str,
    signing_key: &[u8],
    now: i64,
    ttl_secs: i64,
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = usize::try_from(now)?;
    let claims = SessionClaims {
        sid: session_id.to_string(),
        iat: now,
        exp: now + usize::try_from(ttl_secs)?,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Verify a session cookie value and return the session ID it names.
pub fn decode_session_jwt(token: &str, signing_key: &[u8]) -> Option<String> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims.sid)
        .ok()
}

/// Build the `Set-Cookie` for a fresh session.
pub fn session_cookie(value: String, secure: bool, ttl_secs: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(ttl_secs))
        .build()
}

/// Build the removal cookie for logout (attributes match creation).
pub fn session_removal_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

/// Resolve the session named by the request's cookie, if it is signed by us
/// and still present in the store.
pub fn resolve_session(state: &AppState, jar: &CookieJar, now: i64) -> Option<SessionUser> {
    let cookie = jar.get(SESSION_COOKIE)?;
    let session_id = decode_session_jwt(cookie.value(), &state.config.session_signing_key)?;
    let record = state.sessions.get(&session_id, now)?;

    Some(SessionUser { session_id, record })
}

/// Middleware that requires a live session.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let now = crate::time_utils::unix_now();
    let user = resolve_session(&state, &jar, now).ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test_session_key_32_bytes_minimum!!";

    #[test]
    fn test_session_jwt_roundtrip() {
        let now = crate::time_utils::unix_now();
        let token = create_session_jwt("abc123", KEY, now, 3600).unwrap();
        assert_eq!(decode_session_jwt(&token, KEY), Some("abc123".to_string()));
    }

    #[test]
    fn test_session_jwt_wrong_key() {
        let now = crate::time_utils::unix_now();
        let token = create_session_jwt("abc123", KEY, now, 3600).unwrap();
        assert_eq!(decode_session_jwt(&token, b"some_other_key_that_is_long_enough"), None);
    }

    #[test]
    fn test_session_jwt_expired() {
        let now = crate::time_utils::unix_now();
        // Issued long ago, expired well beyond the default leeway
        let token = create_session_jwt("abc123", KEY, now - 10_000, 3600).unwrap();
        assert_eq!(decode_session_jwt(&token, KEY), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("value".to_string(), true, 60).to_string();
        assert!(cookie.starts_with("strava_session=value"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=60"));

        let removal = session_removal_cookie(false).to_string();
        assert!(removal.contains("Max-Age=0"));
        assert!(!removal.contains("Secure"));
    }
}
