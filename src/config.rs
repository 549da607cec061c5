// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; handlers only ever see the
//! `Config` owned by `AppState`.

use std::env;
use std::time::Duration;

/// Fixed page size for upstream activity listings.
pub const ACTIVITIES_PER_PAGE: u32 = 200;

/// Which condition selects the authorized view on `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingGate {
    /// Any `Cookie` header at all (legacy behaviour, not token-specific).
    AnyCookie,
    /// A verified session cookie backed by a live session record.
    Session,
}

impl LandingGate {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "any_cookie" | "cookie" => Ok(Self::AnyCookie),
            "session" => Ok(Self::Session),
            _ => Err(ConfigError::Invalid("LANDING_GATE")),
        }
    }
}

/// Limits for the paginated activity fetch.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// Records requested per page.
    pub per_page: u32,
    /// Hard cap on pages requested in one fetch.
    pub max_pages: u32,
    /// Retries per page on transient upstream failures.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub initial_backoff: Duration,
    /// Upper bound on a single backoff delay.
    pub max_backoff: Duration,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            per_page: ACTIVITIES_PER_PAGE,
            max_pages: 100,
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Strava OAuth client ID (public)
    pub strava_client_id: String,
    /// Strava OAuth client secret. Not validated; a bad value surfaces as
    /// an upstream auth failure.
    pub strava_client_secret: String,
    /// Authorize URL handed to the views for the legacy flow
    pub oauth_url: String,
    /// Externally visible base URL of this service
    pub public_url: String,
    /// Server port
    pub port: u16,
    /// HS256 key for session cookies and OAuth state signatures (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// Strava REST API base
    pub strava_api_url: String,
    /// Strava OAuth base (token endpoint is `{strava_oauth_url}/token`)
    pub strava_oauth_url: String,
    /// Deadline for every outbound upstream call
    pub upstream_timeout: Duration,
    /// Pre-flight refresh fires when `expires_at - margin <= now`
    pub refresh_margin_secs: i64,
    pub pagination: PaginationConfig,
    pub landing_gate: LandingGate,
    /// Directory served as the static-asset fallback
    pub static_dir: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let strava_client_id = env::var("STRAVA_CLIENT_ID")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_ID"))?;

        let public_url = env::var("PUBLIC_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let oauth_url = env::var("OAUTH_URL")
            .unwrap_or_else(|_| default_oauth_url(&strava_client_id, &public_url));

        let session_signing_key = env::var("SESSION_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
            .into_bytes();
        if session_signing_key.len() < 32 {
            return Err(ConfigError::Invalid("SESSION_SIGNING_KEY"));
        }

        let defaults = PaginationConfig::default();
        let pagination = PaginationConfig {
            max_pages: parse_var("FETCH_MAX_PAGES", defaults.max_pages)?,
            max_retries: parse_var("FETCH_MAX_RETRIES", defaults.max_retries)?,
            initial_backoff: Duration::from_millis(parse_var(
                "FETCH_INITIAL_BACKOFF_MS",
                defaults.initial_backoff.as_millis() as u64,
            )?),
            ..defaults
        };

        let landing_gate = match env::var("LANDING_GATE") {
            Ok(raw) => LandingGate::parse(&raw)?,
            Err(_) => LandingGate::AnyCookie,
        };

        Ok(Self {
            strava_client_id,
            strava_client_secret: env::var("STRAVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            oauth_url,
            public_url,
            port: parse_var("PORT", 8080)?,
            session_signing_key,
            strava_api_url: env::var("STRAVA_API_URL")
                .unwrap_or_else(|_| "https://www.strava.com/api/v3".to_string()),
            strava_oauth_url: env::var("STRAVA_OAUTH_URL")
                .unwrap_or_else(|_| "https://www.strava.com/oauth".to_string()),
            upstream_timeout: Duration::from_secs(parse_var("UPSTREAM_TIMEOUT_SECS", 30)?),
            refresh_margin_secs: parse_var("TOKEN_REFRESH_MARGIN_SECS", 60)?,
            pagination,
            landing_gate,
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string()),
        })
    }

    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            oauth_url: default_oauth_url("test_client_id", "http://localhost:8080"),
            public_url: "http://localhost:8080".to_string(),
            port: 8080,
            session_signing_key: b"test_session_key_32_bytes_minimum!!".to_vec(),
            strava_api_url: "http://127.0.0.1:9/api/v3".to_string(),
            strava_oauth_url: "http://127.0.0.1:9/oauth".to_string(),
            upstream_timeout: Duration::from_secs(5),
            refresh_margin_secs: 60,
            pagination: PaginationConfig {
                max_retries: 0,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(10),
                ..PaginationConfig::default()
            },
            landing_gate: LandingGate::AnyCookie,
            static_dir: "public".to_string(),
        }
    }

    /// Point both upstream bases at a single mock server.
    pub fn with_upstream(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.strava_api_url = format!("{}/api/v3", base);
        self.strava_oauth_url = format!("{}/oauth", base);
        self
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn cookies_secure(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

/// Authorize URL for the legacy `/exchange_token` callback.
fn default_oauth_url(client_id: &str, public_url: &str) -> String {
    format!(
        "https://www.strava.com/oauth/authorize?client_id={}&redirect_uri={}&response_type=code&approval_prompt=force&scope=activity:read_all",
        client_id,
        urlencoding::encode(&format!("{}/exchange_token", public_url))
    )
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
