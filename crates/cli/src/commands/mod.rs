//! CLI command implementations.

pub mod admin;
pub mod catalog;
pub mod settings;
