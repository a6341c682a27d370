//! Integration tests for the persisted image host key.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use secrecy::ExposeSecret;

use catalog_desk_admin::services::{SettingsError, SettingsStore};

#[tokio::test]
async fn test_key_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");

    let store = SettingsStore::open(&path).await.unwrap();
    assert!(store.image_host_api_key().await.is_none());
    store.save_image_host_api_key("  key-123  ").await.unwrap();
    drop(store);

    let reopened = SettingsStore::open(&path).await.unwrap();
    let key = reopened.image_host_api_key().await.expect("key persisted");
    assert_eq!(key.expose_secret(), "key-123");
}

#[tokio::test]
async fn test_blank_key_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    let store = SettingsStore::open(&path).await.unwrap();
    store.save_image_host_api_key("first").await.unwrap();
    let err = store.save_image_host_api_key("   ").await.unwrap_err();

    assert!(matches!(err, SettingsError::EmptyKey));
    let reopened = SettingsStore::open(&path).await.unwrap();
    assert_eq!(
        reopened.image_host_api_key().await.unwrap().expose_secret(),
        "first"
    );
}

#[tokio::test]
async fn test_corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = SettingsStore::open(&path).await.err().unwrap();

    assert!(matches!(err, SettingsError::Serialization(_)));
}
