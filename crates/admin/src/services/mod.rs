//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - single-admin login against an argon2 hash
//! - `product_sync` - product save/delete workflow against the remote stores
//! - `settings` - persisted image-host API key
//! - `views` - tab switching, loaders and view models

pub mod auth;
pub mod product_sync;
pub mod settings;
pub mod views;

pub use auth::{AdminAuthService, LoginOutcome, hash_password, verify_password};
pub use product_sync::{ProductForm, ProductSyncService, SaveOutcome, SyncError};
pub use settings::{SettingsError, SettingsStore};
pub use views::{
    CatalogFormat, DashboardView, OrderRow, ProductRow, Section, SettingsView, Tab, TabLink,
    TabSwitch, TabView, UnknownTab, ViewController,
};
