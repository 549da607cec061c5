// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cookie-session OAuth flow.
//!
//! Tokens stay on the server: the browser only ever holds a signed cookie
//! naming an opaque session ID.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::middleware::session::{
    create_session_jwt, require_session, session_cookie, session_removal_cookie, SessionUser,
};
use crate::routes::data::parse_timestamp;
use crate::routes::pages::error_page;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Cookie binding the OAuth `state` to the browser that started the flow.
pub const OAUTH_NONCE_COOKIE: &str = "strava_oauth_nonce";

const CALLBACK_PATH: &str = "/session/callback";

/// How long a signed OAuth state stays acceptable (10 minutes).
const STATE_MAX_AGE_SECS: i64 = 10 * 60;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/session/activities", get(session_activities))
        .route("/session/me", get(session_me))
        .route_layer(middleware::from_fn_with_state(state, require_session));

    Router::new()
        .route("/session/start", get(session_start))
        .route(CALLBACK_PATH, get(session_callback))
        .route("/session/logout", post(logout))
        .merge(protected)
}

fn nonce_cookie(value: String, secure: bool, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((OAUTH_NONCE_COOKIE, value))
        .path(CALLBACK_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Sign `timestamp_hex|nonce` and pack it as URL-safe base64.
fn sign_state(nonce: &str, timestamp: i64, secret: &[u8]) -> Result<String> {
    let payload = format!("{:x}|{}", timestamp, nonce);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify the state signature and age; return the nonce it carries.
fn verify_state(state: &str, secret: &[u8], now: i64) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "timestamp_hex|nonce|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }
    let (timestamp_hex, nonce, signature_hex) = (parts[0], parts[1], parts[2]);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(format!("{}|{}", timestamp_hex, nonce).as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_at = i64::from_str_radix(timestamp_hex, 16).ok()?;
    if now - issued_at > STATE_MAX_AGE_SECS || issued_at > now {
        tracing::warn!(issued_at, "OAuth state outside its validity window");
        return None;
    }

    Some(nonce.to_string())
}

/// `GET /session/start` - redirect to Strava authorization.
async fn session_start(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response> {
    let mut nonce_bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Nonce generation failed")))?;
    let nonce = hex::encode(nonce_bytes);

    let now = crate::time_utils::unix_now();
    let oauth_state = sign_state(&nonce, now, &state.config.session_signing_key)?;
    let callback_url = format!("{}{}", state.config.public_url, CALLBACK_PATH);

    let auth_url = format!(
        "https://www.strava.com/oauth/authorize?\
         client_id={}&\
         redirect_uri={}&\
         response_type=code&\
         approval_prompt=auto&\
         scope=activity:read_all&\
         state={}",
        state.config.strava_client_id,
        urlencoding::encode(&callback_url),
        oauth_state
    );

    tracing::info!(
        client_id = %state.config.strava_client_id,
        "Starting OAuth flow, redirecting to Strava"
    );

    let jar = jar.add(nonce_cookie(
        nonce,
        state.config.cookies_secure(),
        STATE_MAX_AGE_SECS,
    ));
    Ok((jar, Redirect::temporary(&auth_url)).into_response())
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// `GET /session/callback` - exchange the code and open a session.
async fn session_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let secure = state.config.cookies_secure();
    let now = crate::time_utils::unix_now();

    let expected_nonce = jar.get(OAUTH_NONCE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(nonce_cookie(String::new(), secure, 0));

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
        return (
            jar,
            error_page(&state, StatusCode::BAD_REQUEST, "Strava authorization was not granted."),
        )
            .into_response();
    }

    let nonce = params
        .state
        .as_deref()
        .and_then(|s| verify_state(s, &state.config.session_signing_key, now));
    let state_ok = matches!((&nonce, &expected_nonce), (Some(n), Some(e)) if n == e);
    if !state_ok {
        tracing::warn!("Invalid or tampered OAuth state parameter");
        return (
            jar,
            error_page(&state, StatusCode::BAD_REQUEST, "Sign-in request expired or was invalid."),
        )
            .into_response();
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return (
            jar,
            error_page(&state, StatusCode::BAD_REQUEST, "Missing authorization code."),
        )
            .into_response();
    };

    let (tokens, athlete) = match state.strava.exchange_code(&code, now).await {
        Ok(result) => result,
        Err(e) => {
            return (
                jar,
                error_page(&state, e.status(), "Could not complete sign-in with Strava."),
            )
                .into_response();
        }
    };

    let opened = state
        .sessions
        .create(tokens, athlete, now)
        .and_then(|session_id| {
            create_session_jwt(
                &session_id,
                &state.config.session_signing_key,
                now,
                state.sessions.ttl_secs(),
            )
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Session token creation failed: {}", e)))
        });

    match opened {
        Ok(jwt) => {
            tracing::info!(active_sessions = state.sessions.len(), "Session opened");
            let jar = jar.add(session_cookie(jwt, secure, state.sessions.ttl_secs()));
            (jar, Redirect::to("/")).into_response()
        }
        Err(e) => (jar, e).into_response(),
    }
}

#[derive(Deserialize)]
pub struct SessionActivitiesParams {
    #[serde(default)]
    lasttime: Option<String>,
}

/// `GET /session/activities` - activities for the session's athlete.
async fn session_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Query(params): Query<SessionActivitiesParams>,
) -> Result<Json<Vec<serde_json::Value>>> {
    let after = match params.lasttime.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => parse_timestamp(raw, "lasttime")?,
        None => 0,
    };
    let now = crate::time_utils::unix_now();

    let (tokens, refreshed) = state.strava.ensure_fresh(user.record.tokens, now).await?;
    if refreshed && !state.sessions.update_tokens(&user.session_id, tokens.clone()) {
        tracing::warn!("Session disappeared during token refresh");
    }

    let activities = state
        .strava
        .fetch_activities(&tokens.access_token, after)
        .await?;

    tracing::info!(count = activities.len(), refreshed, "Session activities fetched");
    Ok(Json(activities))
}

/// Current session profile.
#[derive(Serialize)]
pub struct SessionProfile {
    pub athlete_name: String,
    pub athlete_city: String,
    pub athlete_pic: String,
    pub expires_at: i64,
}

async fn session_me(Extension(user): Extension<SessionUser>) -> Json<SessionProfile> {
    let athlete = &user.record.athlete;
    Json(SessionProfile {
        athlete_name: athlete.display_name(),
        athlete_city: athlete.city_or_empty().to_string(),
        athlete_pic: athlete.profile_or_empty().to_string(),
        expires_at: user.record.tokens.expires_at,
    })
}

/// `POST /session/logout` - drop the session and clear the cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let now = crate::time_utils::unix_now();
    if let Some(user) = crate::middleware::session::resolve_session(&state, &jar, now) {
        state.sessions.remove(&user.session_id);
        tracing::info!("Session closed");
    }

    let jar = jar.add(session_removal_cookie(state.config.cookies_secure()));
    (jar, StatusCode::NO_CONTENT)
}
