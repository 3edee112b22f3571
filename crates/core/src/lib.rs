//! Core business logic for Procura.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here; persistence
//! is reached through the collaborator traits in `purchasing::store`.
//!
//! # Modules
//!
//! - `purchasing` - Purchase entry lifecycle, costing, receiving and payments

pub mod purchasing;
