//! # Mosaic Common Library
//!
//! Shared code for the Mosaic content backend:
//! - Crate-wide error types
//! - Configuration loading (TOML file + environment overrides)
//! - SQLite initialization and the read-only fallback queries

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
