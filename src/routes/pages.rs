// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Landing page and the legacy OAuth callback.

use crate::config::LandingGate;
use crate::middleware::session::resolve_session;
use crate::views::{render, View, ViewParams};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

/// Cookie names written by `/exchange_token`.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const EXPIRES_AT_COOKIE: &str = "expires_at";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const ATHLETE_NAME_COOKIE: &str = "athlete_name";
pub const ATHLETE_CITY_COOKIE: &str = "athlete_city";
pub const ATHLETE_PIC_COOKIE: &str = "athlete_pic_url";

/// Unix seconds of the last completed download, written by the page script.
pub const LAST_FETCH_COOKIE: &str = "last_fetch";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(landing))
        .route("/exchange_token", get(exchange_token))
}

/// Authorize URL the views should link to under the configured gate.
pub(crate) fn view_oauth_url(state: &AppState) -> &str {
    match state.config.landing_gate {
        LandingGate::AnyCookie => state.config.oauth_url.as_str(),
        LandingGate::Session => "/session/start",
    }
}

/// Last download time from the `last_fetch` cookie. Only a unix timestamp is
/// accepted, so no other cookie value can reach the page.
fn last_fetch_display(jar: &CookieJar) -> Option<String> {
    let secs = jar.get(LAST_FETCH_COOKIE)?.value().trim().parse::<i64>().ok()?;
    Some(crate::time_utils::format_unix_rfc3339(secs))
}

/// Render an error page.
pub(crate) fn error_page(state: &AppState, status: StatusCode, message: &str) -> Response {
    let params = ViewParams::new(view_oauth_url(state), None).with_message(message);
    (status, render(View::Error, &params)).into_response()
}

/// `GET /` - get-started or authorized view.
///
/// Under `LandingGate::AnyCookie` the presence of any cookie at all selects
/// the authorized view, even one unrelated to Strava tokens.
async fn landing(State(state): State<Arc<AppState>>, headers: HeaderMap, jar: CookieJar) -> Response {
    let mut params = ViewParams::new(view_oauth_url(&state), last_fetch_display(&jar));

    let authorized = match state.config.landing_gate {
        LandingGate::AnyCookie => {
            if headers.contains_key(header::COOKIE) {
                params.authorized = true;
                let cookie_value =
                    |name: &str| jar.get(name).map(|c| c.value().to_string()).unwrap_or_default();
                params.athlete_name = cookie_value(ATHLETE_NAME_COOKIE);
                params.athlete_city = cookie_value(ATHLETE_CITY_COOKIE);
                params.athlete_pic = cookie_value(ATHLETE_PIC_COOKIE);
                true
            } else {
                false
            }
        }
        LandingGate::Session => {
            let now = crate::time_utils::unix_now();
            match resolve_session(&state, &jar, now) {
                Some(user) => {
                    params = params.with_athlete(&user.record.athlete);
                    true
                }
                None => false,
            }
        }
    };

    let view = if authorized {
        View::Authorized
    } else {
        View::GetStarted
    };
    render(view, &params).into_response()
}

#[derive(Deserialize)]
pub struct ExchangeParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// `GET /exchange_token` - legacy OAuth callback.
///
/// Exchanges the code and hands the token triple plus athlete fields back to
/// the browser as six separate cookies.
async fn exchange_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<ExchangeParams>,
) -> Response {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
        return error_page(&state, StatusCode::BAD_REQUEST, "Strava authorization was not granted.");
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return error_page(&state, StatusCode::BAD_REQUEST, "Missing authorization code.");
    };

    let now = crate::time_utils::unix_now();
    let (tokens, athlete) = match state.strava.exchange_code(&code, now).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "Token exchange failed");
            return error_page(&state, e.status(), "Could not complete sign-in with Strava.");
        }
    };

    let secure = state.config.cookies_secure();
    let client_cookie = |name: &'static str, value: String| {
        Cookie::build((name, value))
            .path("/")
            .same_site(SameSite::Lax)
            .secure(secure)
            .build()
    };

    let jar = jar
        .add(client_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone()))
        .add(client_cookie(EXPIRES_AT_COOKIE, tokens.expires_at.to_string()))
        .add(client_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone()))
        .add(client_cookie(ATHLETE_NAME_COOKIE, athlete.display_name()))
        .add(client_cookie(ATHLETE_CITY_COOKIE, athlete.city_or_empty().to_string()))
        .add(client_cookie(ATHLETE_PIC_COOKIE, athlete.profile_or_empty().to_string()));

    tracing::info!(athlete = %athlete.display_name(), "Legacy OAuth exchange complete");

    let view_params =
        ViewParams::new(view_oauth_url(&state), last_fetch_display(&jar)).with_athlete(&athlete);
    (jar, render(View::Authorized, &view_params)).into_response()
}
