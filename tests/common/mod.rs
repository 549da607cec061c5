// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{body::Body, http::header, response::Response};
use serde_json::{json, Value};
use std::sync::Arc;
use strava_data::config::Config;
use strava_data::routes::create_router;
use strava_data::AppState;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config whose upstream endpoints point at the mock server.
#[allow(dead_code)]
pub fn test_config(upstream: &MockServer) -> Config {
    Config::test_default().with_upstream(&upstream.uri())
}

/// Create a test app against a mock Strava upstream.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(upstream: &MockServer) -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(test_config(upstream))
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config).expect("state should build"));
    (create_router(state.clone()), state)
}

#[allow(dead_code)]
pub fn now() -> i64 {
    strava_data::time_utils::unix_now()
}

/// Token endpoint body for a successful authorization code exchange.
#[allow(dead_code)]
pub fn exchange_body(expires_at: i64) -> Value {
    json!({
        "token_type": "Bearer",
        "expires_at": expires_at,
        "expires_in": 21600,
        "refresh_token": "upstream-refresh",
        "access_token": "upstream-access",
        "athlete": {
            "id": 134815,
            "firstname": "Jane",
            "lastname": "Doe",
            "city": "Palo Alto",
            "profile": "https://dgalywyr863hv.cloudfront.net/pictures/athletes/134815/large.jpg"
        }
    })
}

/// Token endpoint body for a successful refresh.
#[allow(dead_code)]
pub fn refresh_body(access: &str, refresh: &str, expires_at: i64) -> Value {
    json!({
        "token_type": "Bearer",
        "access_token": access,
        "refresh_token": refresh,
        "expires_at": expires_at,
        "expires_in": 21600
    })
}

/// Mount a successful code exchange for `code`, expected exactly once.
#[allow(dead_code)]
pub async fn mount_exchange(server: &MockServer, code: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains(format!("code={code}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(exchange_body(now() + 21600)))
        .expect(1)
        .mount(server)
        .await;
}

/// `count` opaque activities tagged with their page.
#[allow(dead_code)]
pub fn activities(page: u32, count: usize) -> Value {
    Value::Array(
        (0..count)
            .map(|i| json!({ "id": page as usize * 1000 + i, "name": format!("Activity {page}-{i}") }))
            .collect(),
    )
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Decoded value of the named cookie from a list of `Set-Cookie` headers.
#[allow(dead_code)]
pub fn cookie_value(headers: &[String], name: &str) -> Option<String> {
    headers.iter().find_map(|value| {
        let pair = value.split(';').next()?;
        let (cookie_name, cookie_value) = pair.split_once('=')?;
        (cookie_name == name).then(|| urlencoding::decode(cookie_value).unwrap().into_owned())
    })
}

#[allow(dead_code)]
pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

#[allow(dead_code)]
pub fn get(uri: &str) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
