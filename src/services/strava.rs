// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client and token lifecycle.
//!
//! Handles:
//! - Authorization code exchange
//! - Token refresh, including the pre-flight expiry check
//! - Single-page activity listing (see `pagination` for the full walk)

use crate::config::{Config, PaginationConfig};
use crate::error::AppError;
use crate::models::{Athlete, FetchCursor, TokenSet};
use crate::services::pagination::ActivityFetcher;
use reqwest::StatusCode;
use serde::Deserialize;

/// Failure talking to Strava, classified for retry decisions.
#[derive(Debug, thiserror::Error)]
pub enum StravaError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl StravaError {
    /// Whether a retry of the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StravaError::Transport(_) => true,
            StravaError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            StravaError::Decode(_) => false,
        }
    }
}

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    api_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a client from the process configuration.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.strava_api_url.trim_end_matches('/').to_string(),
            token_url: format!("{}/token", config.strava_oauth_url.trim_end_matches('/')),
            client_id: config.strava_client_id.clone(),
            client_secret: config.strava_client_secret.clone(),
        })
    }

    /// Exchange an authorization code for tokens and the athlete profile.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, StravaError> {
        self.post_token_form(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ])
        .await
    }

    /// Trade a refresh token for a new token triple.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenSet, StravaError> {
        let response: TokenRefreshResponse = self
            .post_token_form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        Ok(TokenSet {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: response.expires_at,
        })
    }

    /// List one page of the athlete's activities after `cursor.after_timestamp`.
    ///
    /// Activities are returned as opaque JSON objects, in upstream order.
    pub async fn list_activities(
        &self,
        access_token: &str,
        cursor: &FetchCursor,
        per_page: u32,
    ) -> Result<Vec<serde_json::Value>, StravaError> {
        let url = format!("{}/athlete/activities", self.api_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("per_page", per_page.to_string()),
                ("page", cursor.page.to_string()),
                ("after", cursor.after_timestamp.to_string()),
            ])
            .send()
            .await
            .map_err(|e| StravaError::Transport(e.to_string()))?;

        check_response_json(response).await
    }

    /// POST a form to the OAuth token endpoint.
    async fn post_token_form<T: for<'de> Deserialize<'de>>(
        &self,
        form: &[(&str, &str)],
    ) -> Result<T, StravaError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| StravaError::Transport(e.to_string()))?;

        check_response_json(response).await
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, StravaError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Strava rate limit hit (429)");
        }

        return Err(StravaError::Status { status, body });
    }

    response
        .json()
        .await
        .map_err(|e| StravaError::Decode(e.to_string()))
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
struct TokenRefreshResponse {
    access_token: String,
    refresh_token: String,
    expires_at: i64,
}

/// Token exchange response from Strava OAuth (includes athlete info).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    access_token: String,
    refresh_token: String,
    expires_at: i64,
    athlete: Athlete,
}

impl TokenExchangeResponse {
    pub fn into_parts(self) -> (TokenSet, Athlete) {
        (
            TokenSet {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                expires_at: self.expires_at,
            },
            self.athlete,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StravaService - token lifecycle policy on top of the client
// ─────────────────────────────────────────────────────────────────────────────

/// High-level Strava service.
///
/// Stateless apart from configuration: every call carries its own token
/// material, so a single instance is shared by all requests.
#[derive(Clone)]
pub struct StravaService {
    client: StravaClient,
    refresh_margin_secs: i64,
    pagination: PaginationConfig,
}

impl StravaService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            client: StravaClient::new(config)?,
            refresh_margin_secs: config.refresh_margin_secs,
            pagination: config.pagination.clone(),
        })
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Exchange an OAuth authorization code for a token set and athlete.
    pub async fn exchange_code(&self, code: &str, now: i64) -> Result<(TokenSet, Athlete), AppError> {
        let response = self.client.exchange_code(code).await.map_err(|e| {
            tracing::error!(error = %e, "Strava token exchange failed");
            AppError::UpstreamAuth(format!("Token exchange failed: {}", e))
        })?;

        let (tokens, athlete) = response.into_parts();
        ensure_not_expired(&tokens, now)?;

        tracing::info!(
            expires_in = tokens.expires_in(now),
            "Authorization code exchanged for tokens"
        );
        Ok((tokens, athlete))
    }

    /// Refresh a token set unconditionally.
    pub async fn refresh(&self, refresh_token: &str, now: i64) -> Result<TokenSet, AppError> {
        let tokens = self.client.refresh_token(refresh_token).await.map_err(|e| {
            tracing::error!(error = %e, "Strava token refresh failed");
            AppError::UpstreamAuth(format!("Token refresh failed: {}", e))
        })?;

        ensure_not_expired(&tokens, now)?;
        Ok(tokens)
    }

    /// Pre-flight check: refresh when the access token is within the refresh
    /// margin of its expiry.
    ///
    /// Returns the token set to use and whether it was replaced. A failed
    /// refresh is fatal for the caller's request.
    pub async fn ensure_fresh(&self, tokens: TokenSet, now: i64) -> Result<(TokenSet, bool), AppError> {
        if !tokens.needs_refresh(now, self.refresh_margin_secs) {
            return Ok((tokens, false));
        }

        tracing::info!(
            expires_at = %crate::time_utils::format_unix_rfc3339(tokens.expires_at),
            "Access token expired or expiring, refreshing"
        );

        let refreshed = self.refresh(&tokens.refresh_token, now).await?;
        Ok((refreshed, true))
    }

    // ─── Activities ──────────────────────────────────────────────────────────

    /// Fetch every activity strictly after `after`, across all pages.
    pub async fn fetch_activities(
        &self,
        access_token: &str,
        after: i64,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        ActivityFetcher::new(&self.client, &self.pagination)
            .fetch_all(access_token, after)
            .await
    }
}

fn ensure_not_expired(tokens: &TokenSet, now: i64) -> Result<(), AppError> {
    if tokens.expires_at <= now {
        tracing::error!(
            expires_at = tokens.expires_at,
            now,
            "Strava returned an already-expired access token"
        );
        return Err(AppError::UpstreamAuth(
            "Strava returned an already-expired access token".to_string(),
        ));
    }
    Ok(())
}
