//! Integration tests for the product form, save and delete routes.
//!
//! Multipart bodies are built by hand so the field names the form template
//! uses are exercised exactly as a browser would send them.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use axum::http::StatusCode;

use catalog_desk_admin::app;
use catalog_desk_admin::catalog::CatalogAction;
use catalog_desk_admin::images::MAX_IMAGE_BYTES;
use catalog_desk_core::ProductId;
use catalog_desk_integration_tests::http::{
    body_text, get, location, logged_in, post_form, post_multipart, send,
};
use catalog_desk_integration_tests::{
    CatalogReply, RecordingImages, TestApp, TestAppBuilder, UPLOADED_URL,
};

const FIELDS: &[(&str, &str)] = &[
    ("editing_product_id", ""),
    ("name", "Garlic Pickle"),
    ("category", "pickles"),
    ("price", "220"),
    ("quantity", "5"),
    ("description", "Slow cured"),
    ("features", "Handmade|Small batch"),
    ("image", "https://i.ibb.co/existing.jpg"),
];

fn fields_with<'a>(overrides: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    FIELDS
        .iter()
        .map(|&(name, value)| {
            overrides
                .iter()
                .find(|(n, _)| *n == name)
                .map_or((name, value), |&(n, v)| (n, v))
        })
        .collect()
}

fn builder() -> TestAppBuilder {
    TestApp::builder().reload_delay(Duration::from_secs(60))
}

// ============================================================================
// Save
// ============================================================================

#[tokio::test]
async fn test_save_without_file_adds_and_redirects() {
    let test = builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let request = post_multipart("/products", FIELDS, None, &cookie);
    let response = send(&router, request).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/products");
    assert_eq!(test.images.uploads(), 0);
    let writes = test.catalog.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].action, CatalogAction::Add);
    assert_eq!(writes[0].id, None);
    let data = writes[0].data.as_ref().unwrap();
    assert_eq!(data.name, "Garlic Pickle");
    assert_eq!(data.image, "https://i.ibb.co/existing.jpg");

    let html = body_text(send(&router, get("/products", Some(&cookie))).await).await;
    assert!(html.contains("Product added successfully!"));
}

#[tokio::test]
async fn test_save_with_file_uploads_it() {
    let test = builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let request = post_multipart("/products", FIELDS, Some(("image_file", vec![0xFF; 512])), &cookie);
    let response = send(&router, request).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(test.images.uploads(), 1);
    let writes = test.catalog.writes();
    assert_eq!(writes[0].data.as_ref().unwrap().image, UPLOADED_URL);
}

#[tokio::test]
async fn test_save_with_editing_id_updates() {
    let test = builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let fields = fields_with(&[("editing_product_id", "2")]);
    let response = send(&router, post_multipart("/products", &fields, None, &cookie)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let writes = test.catalog.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].action, CatalogAction::Update);
    assert_eq!(writes[0].id, Some(ProductId::new(2)));
}

#[tokio::test]
async fn test_invalid_form_is_redisplayed_with_typed_values() {
    let test = builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let fields = fields_with(&[("price", "abc")]);
    let response = send(&router, post_multipart("/products", &fields, None, &cookie)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("Invalid price"));
    assert!(html.contains(r#"value="Garlic Pickle""#));
    assert!(test.catalog.writes().is_empty());
}

#[tokio::test]
async fn test_file_just_over_limit_is_rejected() {
    let test = builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let file = vec![0xFF; MAX_IMAGE_BYTES + 10];
    let request = post_multipart("/products", FIELDS, Some(("image_file", file)), &cookie);
    let response = send(&router, request).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("less than 10MB"));
    assert!(html.contains("Please choose a smaller image"));
    assert_eq!(test.images.uploads(), 0);
    assert!(test.catalog.writes().is_empty());
}

#[tokio::test]
async fn test_body_over_route_limit_is_rejected_as_too_large() {
    let test = builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let file = vec![0xFF; 12 * 1024 * 1024];
    let request = post_multipart("/products", FIELDS, Some(("image_file", file)), &cookie);
    let response = send(&router, request).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("less than 10MB"));
    assert_eq!(test.images.uploads(), 0);
    assert!(test.catalog.writes().is_empty());
}

#[tokio::test]
async fn test_missing_image_key_is_conflict() {
    let test = builder().without_image_key().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let request = post_multipart("/products", FIELDS, Some(("image_file", vec![1; 64])), &cookie);
    let response = send(&router, request).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_text(response).await.contains("Settings tab"));
    assert_eq!(test.images.uploads(), 0);
    assert!(test.catalog.writes().is_empty());
}

#[tokio::test]
async fn test_upload_failure_is_bad_gateway() {
    let test = builder().images(RecordingImages::failing()).build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let request = post_multipart("/products", FIELDS, Some(("image_file", vec![1; 64])), &cookie);
    let response = send(&router, request).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("Invalid API v1 key."));
    assert!(test.catalog.writes().is_empty());
}

#[tokio::test]
async fn test_store_rejection_is_bad_gateway() {
    let test = builder().catalog_reply(CatalogReply::Reject).build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let response = send(&router, post_multipart("/products", FIELDS, None, &cookie)).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("Sheet is protected"));
    assert_eq!(test.catalog.writes().len(), 1);
}

// ============================================================================
// Edit & Delete
// ============================================================================

#[tokio::test]
async fn test_edit_form_is_prefilled() {
    let test = builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let response = send(&router, get("/products/1/edit", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"name="editing_product_id" value="1""#));
    assert!(html.contains(r#"value="Mango Pickle""#));
    assert!(html.contains("Handmade|No preservatives"));
}

#[tokio::test]
async fn test_edit_of_unknown_product_is_not_found() {
    let test = builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let response = send(&router, get("/products/99/edit", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_without_confirmation_makes_no_call() {
    let test = builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let response = send(&router, post_form("/products/1/delete", "", Some(&cookie))).await;
    assert_eq!(location(&response), "/products");

    let response = send(&router, post_form("/products/1/delete", "confirm=no", Some(&cookie))).await;
    assert_eq!(location(&response), "/products");

    assert!(test.catalog.writes().is_empty());
}

#[tokio::test]
async fn test_confirmed_delete_sends_one_delete() {
    let test = builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let response = send(&router, post_form("/products/1/delete", "confirm=yes", Some(&cookie))).await;

    assert_eq!(location(&response), "/products");
    let writes = test.catalog.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].action, CatalogAction::Delete);
    assert_eq!(writes[0].id, Some(ProductId::new(1)));
}

#[tokio::test]
async fn test_delete_prompt_names_the_product() {
    let test = builder().build().await;
    let router = app(test.state.clone());
    let cookie = logged_in(&router).await;

    let response = send(&router, get("/products/2/delete", Some(&cookie))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Lime Pickle"));
}
