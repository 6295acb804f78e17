use std::sync::Arc;

use crate::models::{query::Predicate, DataValue, Document, Fields};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
    #[error("document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Access to a collection-oriented document store.
///
/// Collections are created implicitly on first write. Documents come back in
/// identifier order.
pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;
    fn find_where(&self, collection: &str, predicates: &[Predicate]) -> Result<Vec<Document>, StoreError>;

    /// Appends a document under a freshly generated identifier.
    fn add(&self, collection: &str, fields: Fields) -> Result<Arc<str>, StoreError>;
    /// Creates or replaces the document with the given identifier.
    fn put(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;
    /// Merges `fields` into an existing document.
    fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;
    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    fn find_eq(&self, collection: &str, field: &str, value: DataValue) -> Result<Vec<Document>, StoreError> {
        self.find_where(collection, &[Predicate::eq(field, value)])
    }

    fn find_range(&self, collection: &str, field: &str, from: DataValue, to: DataValue) -> Result<Vec<Document>, StoreError> {
        self.find_where(collection, &[Predicate::between(field, from, to)])
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.find_where(collection, &[])
    }
}
