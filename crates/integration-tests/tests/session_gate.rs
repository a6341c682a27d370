//! Integration tests for the admin session gate and HTTP surface.
//!
//! Requests go through the full router (session layer included) with
//! `tower::ServiceExt::oneshot`; no socket is opened.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::http::StatusCode;

use catalog_desk_admin::app;
use catalog_desk_admin::services::auth::INVALID_CREDENTIALS;
use catalog_desk_integration_tests::http::{
    body_text, get, location, logged_in, post_form, send,
};
use catalog_desk_integration_tests::{ADMIN_PASSWORD, ADMIN_USERNAME, FakeReader, TestApp};

// ============================================================================
// Gate
// ============================================================================

#[tokio::test]
async fn test_unauthenticated_request_redirects_to_login() {
    let test = TestApp::builder().build().await;
    let router = app(test.state.clone());

    let response = send(&router, get("/products", None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
    assert_eq!(test.reader.fetch_counts(), (0, 0, 0));
}

#[tokio::test]
async fn test_wrong_password_shows_generic_error() {
    let test = TestApp::builder().build().await;
    let router = app(test.state.clone());

    let body = format!("username={ADMIN_USERNAME}&password=nope");
    let response = send(&router, post_form("/auth/login", &body, None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains(INVALID_CREDENTIALS));
}

#[tokio::test]
async fn test_unknown_user_gets_same_error() {
    let test = TestApp::builder().build().await;
    let router = app(test.state.clone());

    let body = format!("username=root&password={}", ADMIN_PASSWORD.replace(' ', "+"));
    let response = send(&router, post_form("/auth/login", &body, None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains(INVALID_CREDENTIALS));
}

#[tokio::test]
async fn test_login_opens_dashboard() {
    let test = TestApp::builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let response = send(&router, get("/", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(ADMIN_USERNAME));
    assert!(html.contains("Asha Rao"));
}

#[tokio::test]
async fn test_login_page_redirects_when_already_logged_in() {
    let test = TestApp::builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let response = send(&router, get("/auth/login", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_logout_closes_the_session() {
    let test = TestApp::builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let response = send(&router, post_form("/auth/logout", "", Some(&cookie))).await;
    assert_eq!(location(&response), "/auth/login");

    let response = send(&router, get("/customers", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

// ============================================================================
// Tabs & Settings
// ============================================================================

#[tokio::test]
async fn test_tab_route_loads_only_its_collection() {
    let test = TestApp::builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let response = send(&router, get("/tabs/customers", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("asha@example.com"));
    assert_eq!(test.reader.fetch_counts(), (0, 1, 0));
}

#[tokio::test]
async fn test_unknown_tab_route_is_not_found() {
    let test = TestApp::builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let response = send(&router, get("/tabs/reports", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blank_settings_key_is_rejected() {
    let test = TestApp::builder().without_image_key().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let response = send(&router, post_form("/settings", "image_api_key=+++", Some(&cookie))).await;
    assert_eq!(location(&response), "/settings");
    assert!(test.state.settings().image_host_api_key().await.is_none());

    let response = send(&router, get("/settings", Some(&cookie))).await;
    assert!(body_text(response).await.contains("Please enter an image host API key"));
}

#[tokio::test]
async fn test_settings_key_is_stored_and_masked() {
    let test = TestApp::builder().without_image_key().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    send(&router, post_form("/settings", "image_api_key=abc123secret", Some(&cookie))).await;
    assert!(test.state.settings().image_host_api_key().await.is_some());

    let html = body_text(send(&router, get("/settings", Some(&cookie))).await).await;
    assert!(html.contains("Settings saved successfully!"));
    assert!(!html.contains("abc123secret"));
}

#[tokio::test]
async fn test_dashboard_page_without_orders_sheet() {
    let test = TestApp::builder()
        .reader(FakeReader::seeded().without_orders_sheet())
        .build()
        .await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let response = send(&router, get("/", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"id="totalProducts">2<"#));
    assert!(html.contains("orders unavailable"));
    assert!(!html.contains("Catalog unavailable"));
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_readiness_follows_product_load() {
    let test = TestApp::builder().build().await;
    let router = app(test.state.clone());

    let response = send(&router, get("/health/ready", None)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    test.state.data().products().await.unwrap();

    let response = send(&router, get("/health/ready", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(send(&router, get("/health", None)).await.status(), StatusCode::OK);
}
