//! Core types for Catalog Desk.
//!
//! This module provides type-safe wrappers for the catalog's domain concepts.

pub mod customer;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;

pub use customer::Customer;
pub use id::*;
pub use order::{Order, pending_count};
pub use price::{Price, PriceError};
pub use product::{Product, ProductDraft, join_features, parse_features};
pub use status::OrderStatus;
