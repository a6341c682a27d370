//! Catalog Desk Core - Shared domain types.
//!
//! This crate provides the catalog types used across all Catalog Desk components:
//! - `admin` - Server-rendered administration panel
//! - `cli` - Command-line tools for operators
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no spreadsheet access. This keeps it lightweight and allows it to
//! be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, products, customers, orders and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
