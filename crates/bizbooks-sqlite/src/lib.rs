//! SQLite document store backend for bizbooks.
//!
//! Documents are kept as serialized field maps in a single table keyed by
//! `(collection, id)`. Filtering happens after the collection scan, with the
//! same predicate semantics as the in-memory store.

use std::sync::{Arc, Mutex};

use bizbooks_core::{models::query::matches_all, Document, DocumentStore, Fields, Predicate, StoreError};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| StoreError::Other(e.to_string()))?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );
            ",
        )
        .map_err(|e| StoreError::Other(e.to_string()))?;
        Ok(())
    }

    fn read_body(conn: &Connection, collection: &str, id: &str) -> Result<Option<Fields>, StoreError> {
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Other(e.to_string()))?;
        match body {
            Some(b) => Ok(Some(serde_json::from_str(&b)?)),
            None => Ok(None),
        }
    }

    fn write_body(conn: &Connection, collection: &str, id: &str, fields: &Fields) -> Result<(), StoreError> {
        let body = serde_json::to_string(fields)?;
        conn.execute(
            "INSERT OR REPLACE INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
            params![collection, id, body],
        )
        .map_err(|e| StoreError::Other(e.to_string()))?;
        Ok(())
    }
}

impl DocumentStore for SqliteStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Ok(Self::read_body(&conn, collection, id)?.map(|fields| Document::new(id, fields)))
    }

    fn find_where(&self, collection: &str, predicates: &[Predicate]) -> Result<Vec<Document>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id")
            .map_err(|e| StoreError::Other(e.to_string()))?;
        let rows = stmt
            .query_map(params![collection], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))
            .map_err(|e| StoreError::Other(e.to_string()))?;

        let mut result = Vec::new();
        for row in rows {
            let (id, body) = row.map_err(|e| StoreError::Other(e.to_string()))?;
            let doc = Document::new(id.as_str(), serde_json::from_str(&body)?);
            if matches_all(predicates, &doc) {
                result.push(doc);
            }
        }
        tracing::debug!(collection, matched = result.len(), "SQLite query");
        Ok(result)
    }

    fn add(&self, collection: &str, fields: Fields) -> Result<Arc<str>, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        let conn = self.conn.lock().unwrap();
        Self::write_body(&conn, collection, &id, &fields)?;
        tracing::debug!(collection, id = %id, "SQLite document added");
        Ok(Arc::from(id))
    }

    fn put(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        Self::write_body(&conn, collection, id, &fields)
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut existing = Self::read_body(&conn, collection, id)?.ok_or_else(|| StoreError::DocumentNotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        existing.extend(fields);
        Self::write_body(&conn, collection, id, &existing)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let removed = conn
            .execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )
            .map_err(|e| StoreError::Other(e.to_string()))?;
        if removed == 0 {
            return Err(StoreError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
