//! Shared types, errors, and configuration for Procura.
//!
//! This crate provides common types used across all other crates:
//! - Money rounding with decimal precision and currency codes
//! - Typed IDs for type-safe entity references
//! - Pagination types for list queries
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, PurchasingConfig};
pub use error::{AppError, AppResult};
