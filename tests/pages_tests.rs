// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Landing page and legacy OAuth callback tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

#[tokio::test]
async fn test_landing_without_cookie_renders_get_started() {
    let server = MockServer::start().await;
    let (app, state) = common::create_test_app(&server);

    let response = app.oneshot(common::get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = common::body_string(response).await;
    assert!(page.contains("Connect with Strava"));
    assert!(page.contains(&state.config.oauth_url.replace('&', "&amp;")));
}

#[tokio::test]
async fn test_landing_with_unrelated_cookie_renders_authorized() {
    // Any cookie at all selects the authorized view under the default gate
    let server = MockServer::start().await;
    let (app, _) = common::create_test_app(&server);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, "theme=dark")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = common::body_string(response).await;
    assert!(page.contains("data-authorized=\"true\""));
    assert!(!page.contains("dark"));
    assert!(page.contains("never"));
}

#[tokio::test]
async fn test_landing_never_renders_token_cookies() {
    let server = MockServer::start().await;
    let (app, _) = common::create_test_app(&server);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(
                    header::COOKIE,
                    "access_token=secret-bearer-abc; expires_at=1700000000; refresh_token=secret-refresh-xyz",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let page = common::body_string(response).await;
    assert!(!page.contains("secret-bearer-abc"));
    assert!(!page.contains("secret-refresh-xyz"));
    assert!(page.contains("<span id=\"data-timestamp\">never</span>"));
}

#[tokio::test]
async fn test_landing_shows_last_fetch_time() {
    let server = MockServer::start().await;
    let (app, _) = common::create_test_app(&server);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, "access_token=abc; last_fetch=1700000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let page = common::body_string(response).await;
    assert!(page.contains("2023-11-14T22:13:20Z"));
    assert!(!page.contains(">abc<"));
}

#[tokio::test]
async fn test_landing_shows_athlete_from_cookies() {
    let server = MockServer::start().await;
    let (app, _) = common::create_test_app(&server);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(
                    header::COOKIE,
                    "access_token=abc; athlete_name=Jane%20Doe; athlete_city=Palo%20Alto",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let page = common::body_string(response).await;
    assert!(page.contains("Jane Doe"));
    assert!(page.contains("Palo Alto"));
}

#[tokio::test]
async fn test_exchange_token_sets_six_cookies() {
    let server = MockServer::start().await;
    common::mount_exchange(&server, "good-code").await;
    let (app, _) = common::create_test_app(&server);

    let response = app
        .oneshot(common::get("/exchange_token?state=&code=good-code&scope=read"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookies = common::set_cookie_headers(&response);
    assert_eq!(cookies.len(), 6, "unexpected cookies: {cookies:?}");

    let expires_at: i64 = common::cookie_value(&cookies, "expires_at")
        .unwrap()
        .parse()
        .unwrap();
    assert!(expires_at > common::now());
    assert_eq!(
        common::cookie_value(&cookies, "access_token").as_deref(),
        Some("upstream-access")
    );
    assert_eq!(
        common::cookie_value(&cookies, "refresh_token").as_deref(),
        Some("upstream-refresh")
    );
    assert_eq!(
        common::cookie_value(&cookies, "athlete_name").as_deref(),
        Some("Jane Doe")
    );
    assert_eq!(
        common::cookie_value(&cookies, "athlete_city").as_deref(),
        Some("Palo Alto")
    );
    assert_eq!(
        common::cookie_value(&cookies, "athlete_pic_url").as_deref(),
        Some("https://dgalywyr863hv.cloudfront.net/pictures/athletes/134815/large.jpg")
    );

    // Client script reads these, so they must not be HttpOnly
    assert!(cookies.iter().all(|c| !c.contains("HttpOnly")));
    assert!(cookies.iter().all(|c| c.contains("Path=/")));

    let page = common::body_string(response).await;
    assert!(page.contains("Jane Doe"));
    assert!(page.contains("data-authorized=\"true\""));
}

#[tokio::test]
async fn test_exchange_token_upstream_failure_renders_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let (app, _) = common::create_test_app(&server);

    let response = app
        .oneshot(common::get("/exchange_token?code=stale"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(common::set_cookie_headers(&response).is_empty());
    let page = common::body_string(response).await;
    assert!(page.contains("Could not complete sign-in"));
}

#[tokio::test]
async fn test_exchange_token_missing_code() {
    let server = MockServer::start().await;
    let (app, _) = common::create_test_app(&server);

    let response = app.oneshot(common::get("/exchange_token")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(common::set_cookie_headers(&response).is_empty());
}

#[tokio::test]
async fn test_exchange_token_access_denied() {
    let server = MockServer::start().await;
    let (app, _) = common::create_test_app(&server);

    let response = app
        .oneshot(common::get("/exchange_token?state=&error=access_denied"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let server = MockServer::start().await;
    let (app, _) = common::create_test_app(&server);

    let response = app.oneshot(common::get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_cors_preflight() {
    let server = MockServer::start().await;
    let (app, _) = common::create_test_app(&server);

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/fetch_data")
                .header(header::ORIGIN, "http://localhost:8080")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
