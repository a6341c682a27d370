//! Integration tests for the product save and delete workflow.
//!
//! Each test wires the real `ProductSyncService` to recording fakes and checks
//! which remote calls were made, in what shape, and what the admin is told.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use catalog_desk_admin::catalog::{CatalogAction, LoadState};
use catalog_desk_admin::images::MAX_IMAGE_BYTES;
use catalog_desk_admin::services::{ProductForm, SyncError};
use catalog_desk_core::ProductId;
use catalog_desk_integration_tests::{
    CatalogReply, RecordingImages, TestApp, UPLOADED_URL, image, single_write_is,
};

fn create_form(image_url: &str) -> ProductForm {
    ProductForm {
        name: "Garlic Pickle".to_string(),
        category: "pickles".to_string(),
        price: "220".to_string(),
        quantity: "5".to_string(),
        description: "Slow cured".to_string(),
        features: "Handmade|Small batch".to_string(),
        image: image_url.to_string(),
        ..ProductForm::default()
    }
}

// ============================================================================
// Create & Update
// ============================================================================

#[tokio::test]
async fn test_create_with_existing_image_sends_one_add_without_id() {
    let app = TestApp::builder().build().await;
    let form = create_form("https://i.ibb.co/existing.jpg");

    let outcome = app.state.sync().save_product(&form, None).await.unwrap();

    assert_eq!(outcome.action, CatalogAction::Add);
    assert_eq!(outcome.message(), "Product added successfully!");
    assert_eq!(app.images.uploads(), 0);

    let writes = app.catalog.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].action, CatalogAction::Add);
    assert_eq!(writes[0].id, None);
    let data = writes[0].data.as_ref().unwrap();
    assert_eq!(data.name, "Garlic Pickle");
    assert_eq!(data.quantity, 5);
    assert_eq!(data.features, vec!["Handmade", "Small batch"]);
    assert_eq!(data.image, "https://i.ibb.co/existing.jpg");
}

#[tokio::test]
async fn test_new_file_is_uploaded_before_write() {
    let app = TestApp::builder().build().await;
    let form = create_form("");

    let outcome = app
        .state
        .sync()
        .save_product(&form, Some(image(2048)))
        .await
        .unwrap();

    assert_eq!(app.images.uploads(), 1);
    assert_eq!(outcome.image, UPLOADED_URL);
    let writes = app.catalog.writes();
    assert_eq!(writes[0].data.as_ref().unwrap().image, UPLOADED_URL);
}

#[tokio::test]
async fn test_edit_sends_update_with_id() {
    let app = TestApp::builder().build().await;
    let mut form = create_form("https://i.ibb.co/fixture/1.jpg");
    form.editing_product_id = "1".to_string();

    let outcome = app.state.sync().save_product(&form, None).await.unwrap();

    assert_eq!(outcome.action, CatalogAction::Update);
    assert_eq!(outcome.id, Some(ProductId::new(1)));
    assert_eq!(outcome.message(), "Product updated successfully!");
    let writes = app.catalog.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].action, CatalogAction::Update);
    assert_eq!(writes[0].id, Some(ProductId::new(1)));
}

#[tokio::test]
async fn test_edit_of_unknown_product_is_rejected_before_any_call() {
    let app = TestApp::builder().build().await;
    let mut form = create_form("https://i.ibb.co/x.jpg");
    form.editing_product_id = "99".to_string();

    let err = app
        .state
        .sync()
        .save_product(&form, Some(image(16)))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Validation(_)));
    assert_eq!(app.images.uploads(), 0);
    assert!(app.catalog.writes().is_empty());
}

#[tokio::test]
async fn test_missing_image_is_validation_error() {
    let app = TestApp::builder().build().await;

    let err = app
        .state
        .sync()
        .save_product(&create_form(""), None)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Please upload a product image");
    assert!(app.catalog.writes().is_empty());
}

#[tokio::test]
async fn test_unconfirmed_write_still_succeeds() {
    let app = TestApp::builder()
        .catalog_reply(CatalogReply::Unconfirmed)
        .build()
        .await;

    let outcome = app
        .state
        .sync()
        .save_product(&create_form("https://i.ibb.co/a.jpg"), None)
        .await
        .unwrap();

    assert!(!outcome.confirmed);
    assert_eq!(app.catalog.writes().len(), 1);
}

// ============================================================================
// Image failures
// ============================================================================

#[tokio::test]
async fn test_oversized_file_never_reaches_image_host() {
    let app = TestApp::builder().build().await;

    let err = app
        .state
        .sync()
        .save_product(&create_form(""), Some(image(MAX_IMAGE_BYTES + 1)))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::ImageTooLarge { .. }));
    assert!(err.clears_file_input());
    assert_eq!(app.images.uploads(), 0);
    assert!(app.catalog.writes().is_empty());
}

#[tokio::test]
async fn test_missing_api_key_is_configuration_error() {
    let app = TestApp::builder().without_image_key().build().await;

    let err = app
        .state
        .sync()
        .save_product(&create_form(""), Some(image(64)))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Configuration(_)));
    assert!(err.to_string().contains("Settings"));
    assert_eq!(app.images.uploads(), 0);
    assert!(app.catalog.writes().is_empty());
}

#[tokio::test]
async fn test_missing_api_key_is_irrelevant_without_a_file() {
    let app = TestApp::builder().without_image_key().build().await;

    app.state
        .sync()
        .save_product(&create_form("https://i.ibb.co/a.jpg"), None)
        .await
        .unwrap();

    assert!(single_write_is(&app.catalog, CatalogAction::Add));
}

#[tokio::test]
async fn test_upload_failure_stops_before_catalog_write() {
    let app = TestApp::builder()
        .images(RecordingImages::failing())
        .build()
        .await;

    let err = app
        .state
        .sync()
        .save_product(&create_form("https://i.ibb.co/old.jpg"), Some(image(64)))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Upload(_)));
    assert!(!err.clears_file_input());
    assert_eq!(app.images.uploads(), 1);
    assert!(app.catalog.writes().is_empty());
}

// ============================================================================
// Cache & Reload
// ============================================================================

#[tokio::test]
async fn test_successful_save_invalidates_products() {
    let app = TestApp::builder()
        .reload_delay(Duration::from_secs(60))
        .build()
        .await;
    app.state.data().products().await.unwrap();
    assert!(app.state.data().products_cached());

    app.state
        .sync()
        .save_product(&create_form("https://i.ibb.co/a.jpg"), None)
        .await
        .unwrap();

    assert!(!app.state.data().products_cached());
}

#[tokio::test]
async fn test_rejected_write_keeps_cache() {
    let app = TestApp::builder()
        .catalog_reply(CatalogReply::Reject)
        .build()
        .await;
    app.state.data().products().await.unwrap();

    let err = app
        .state
        .sync()
        .save_product(&create_form("https://i.ibb.co/a.jpg"), None)
        .await
        .unwrap_err();

    match err {
        SyncError::Rejected { action, message } => {
            assert_eq!(action, CatalogAction::Add);
            assert_eq!(message, "Sheet is protected");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
    assert!(app.state.data().products_cached());
}

#[tokio::test]
async fn test_save_schedules_product_reload() {
    let app = TestApp::builder()
        .reload_delay(Duration::from_millis(20))
        .build()
        .await;
    let mut state = app.state.data().subscribe();
    assert_eq!(*state.borrow(), LoadState::Loading);

    app.state
        .sync()
        .save_product(&create_form("https://i.ibb.co/a.jpg"), None)
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(2), state.changed())
        .await
        .expect("reload within two seconds")
        .unwrap();
    assert_eq!(*state.borrow(), LoadState::Loaded { count: 2 });
    assert_eq!(app.reader.fetch_counts().0, 1);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_unconfirmed_delete_makes_no_call() {
    let app = TestApp::builder().build().await;

    let err = app
        .state
        .sync()
        .delete_product(ProductId::new(1), false)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::UserCancelled));
    assert!(app.catalog.writes().is_empty());
}

#[tokio::test]
async fn test_confirmed_delete_sends_one_delete() {
    let app = TestApp::builder()
        .reload_delay(Duration::from_secs(60))
        .build()
        .await;
    app.state.data().products().await.unwrap();

    app.state
        .sync()
        .delete_product(ProductId::new(2), true)
        .await
        .unwrap();

    let writes = app.catalog.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].action, CatalogAction::Delete);
    assert_eq!(writes[0].id, Some(ProductId::new(2)));
    assert!(writes[0].data.is_none());
    assert!(!app.state.data().products_cached());
}
