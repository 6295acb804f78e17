//! Core types and traits for bizbooks document store backends.
//!
//! This crate provides the `DocumentStore` trait and the document value
//! model shared by every backend, so storage implementations can live in
//! separate crates.

pub mod models;
pub mod schema;
pub mod store;

// Re-export key types at crate root for convenience
pub use models::{fields, parse_date, parse_decimal, DataValue, Document, Fields};
pub use models::query::Predicate;
pub use store::{DocumentStore, StoreError};
