use std::{collections::BTreeMap, sync::{Arc, RwLock}};

use uuid::Uuid;

use bizbooks_core::models::query::matches_all;

// Re-export core store types so callers can use crate::store::* directly
pub use bizbooks_core::{DataValue, Document, DocumentStore, Fields, Predicate, StoreError};

type Collection = BTreeMap<Arc<str>, Fields>;

/// Store kept entirely in process memory. The default backend, and the one
/// tests run against.
pub struct InMemoryStore {
    collections: RwLock<BTreeMap<Arc<str>, Collection>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
        }
    }

    fn not_found(collection: &str, id: &str) -> StoreError {
        StoreError::DocumentNotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

impl DocumentStore for InMemoryStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().unwrap();
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    fn find_where(&self, collection: &str, predicates: &[Predicate]) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().unwrap();
        let docs = match collections.get(collection) {
            Some(c) => c,
            None => return Ok(Vec::new()),
        };

        let result: Vec<Document> = docs
            .iter()
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .filter(|doc| matches_all(predicates, doc))
            .collect();
        tracing::debug!(
            collection,
            fields = ?predicates.iter().map(Predicate::field).collect::<Vec<_>>(),
            matched = result.len(),
            "Query executed"
        );
        Ok(result)
    }

    fn add(&self, collection: &str, fields: Fields) -> Result<Arc<str>, StoreError> {
        let id: Arc<str> = Arc::from(Uuid::new_v4().simple().to_string());
        let mut collections = self.collections.write().unwrap();
        collections
            .entry(Arc::from(collection))
            .or_default()
            .insert(id.clone(), fields);
        tracing::debug!(collection, id = %id, "Document added");
        Ok(id)
    }

    fn put(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut collections = self.collections.write().unwrap();
        collections
            .entry(Arc::from(collection))
            .or_default()
            .insert(Arc::from(id), fields);
        Ok(())
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut collections = self.collections.write().unwrap();
        let existing = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| Self::not_found(collection, id))?;
        existing.extend(fields);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().unwrap();
        collections
            .get_mut(collection)
            .and_then(|c| c.remove(id))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(collection, id))
    }
}
