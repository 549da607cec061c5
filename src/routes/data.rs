// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Legacy activity download with client-held tokens.

use crate::error::{AppError, Result};
use crate::models::TokenSet;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Response headers echoing the (possibly refreshed) token triple.
pub const ACCESS_TOKEN_HEADER: &str = "accesstoken";
pub const EXPIRES_AT_HEADER: &str = "expiresat";
pub const REFRESH_TOKEN_HEADER: &str = "refreshtoken";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/fetch_data", get(fetch_data))
}

#[derive(Deserialize)]
pub struct FetchDataParams {
    token: Option<String>,
    lasttime: Option<String>,
    refreshtoken: Option<String>,
    expiresat: Option<String>,
}

impl FetchDataParams {
    /// Validate into a token set and the `after` lower bound.
    fn into_parts(self) -> Result<(TokenSet, i64)> {
        let access_token = header_safe(required(self.token, "token")?, "token")?;
        let refresh_token = header_safe(required(self.refreshtoken, "refreshtoken")?, "refreshtoken")?;
        let expires_at = parse_timestamp(&required(self.expiresat, "expiresat")?, "expiresat")?;
        let after = parse_timestamp(&required(self.lasttime, "lasttime")?, "lasttime")?;

        Ok((
            TokenSet {
                access_token,
                refresh_token,
                expires_at,
            },
            after,
        ))
    }
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing '{}' parameter", name)))
}

/// Reject values that could not be echoed back as a response header.
fn header_safe(value: String, name: &str) -> Result<String> {
    HeaderValue::from_str(&value)
        .map_err(|_| AppError::BadRequest(format!("Invalid '{}' parameter", name)))?;
    Ok(value)
}

/// Parse unix seconds. Fractional values (as produced by `Date.now() / 1000`)
/// are truncated.
pub(crate) fn parse_timestamp(raw: &str, name: &str) -> Result<i64> {
    let invalid = || AppError::BadRequest(format!("Invalid '{}' parameter: expected unix seconds", name));
    let raw = raw.trim();

    if let Ok(secs) = raw.parse::<i64>() {
        return Ok(secs);
    }

    raw.parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite())
        .map(|secs| secs.trunc() as i64)
        .ok_or_else(invalid)
}

/// `GET /fetch_data` - refresh if needed, then download every activity
/// after `lasttime`.
async fn fetch_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FetchDataParams>,
) -> Result<(HeaderMap, Json<Vec<serde_json::Value>>)> {
    let (tokens, after) = params.into_parts()?;
    let now = crate::time_utils::unix_now();

    tracing::info!(
        expires_at = %crate::time_utils::format_unix_rfc3339(tokens.expires_at),
        after,
        "Fetching activities for client-held token"
    );

    let (tokens, refreshed) = state.strava.ensure_fresh(tokens, now).await?;
    let activities = state
        .strava
        .fetch_activities(&tokens.access_token, after)
        .await?;

    tracing::info!(count = activities.len(), refreshed, "Activities fetched");

    Ok((token_headers(&tokens)?, Json(activities)))
}

fn token_headers(tokens: &TokenSet) -> Result<HeaderMap> {
    let value = |raw: &str| {
        HeaderValue::from_str(raw)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid token header value: {}", e)))
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(ACCESS_TOKEN_HEADER),
        value(&tokens.access_token)?,
    );
    headers.insert(
        HeaderName::from_static(EXPIRES_AT_HEADER),
        value(&tokens.expires_at.to_string())?,
    );
    headers.insert(
        HeaderName::from_static(REFRESH_TOKEN_HEADER),
        value(&tokens.refresh_token)?,
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(headers)
}
