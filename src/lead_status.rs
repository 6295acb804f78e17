//! Lead status settings: the configurable pipeline stages a lead moves
//! through.

use std::sync::{Arc, Mutex};

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use bizbooks_core::schema::{collections, lead_status, CREATED_AT, UPDATED_AT};

use crate::{
    error::{BooksError, Result},
    store::{DataValue, Document, DocumentStore, Fields, StoreError},
};

pub const DEFAULT_COLOR: &str = "#6c757d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStatus {
    pub id: String,
    pub name: String,
    pub color: String,
    pub order: i64,
    pub is_default: bool,
}

impl LeadStatus {
    fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.to_string(),
            name: doc.text(lead_status::NAME).unwrap_or_default().to_string(),
            color: doc.text(lead_status::COLOR).unwrap_or(DEFAULT_COLOR).to_string(),
            order: doc
                .field(lead_status::ORDER)
                .and_then(DataValue::as_decimal)
                .and_then(|d| d.trunc().to_i64())
                .unwrap_or(0),
            is_default: doc.flag(lead_status::IS_DEFAULT),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStatusInput {
    pub name: Option<String>,
    pub color: Option<String>,
    pub order: Option<i64>,
    pub is_default: Option<bool>,
}

pub struct LeadStatusService {
    store: Arc<dyn DocumentStore>,
    /// Held from the uniqueness check through the write, so concurrent
    /// creates and renames cannot both claim a name.
    writes: Mutex<()>,
}

impl LeadStatusService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            writes: Mutex::new(()),
        }
    }

    /// All statuses by `order`, then name.
    pub fn list(&self) -> Result<Vec<LeadStatus>> {
        let mut statuses: Vec<LeadStatus> = self
            .store
            .list(collections::LEAD_STATUSES)?
            .iter()
            .map(LeadStatus::from_document)
            .collect();
        statuses.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        Ok(statuses)
    }

    pub fn get(&self, id: &str) -> Result<LeadStatus> {
        self.store
            .get(collections::LEAD_STATUSES, id)?
            .map(|doc| LeadStatus::from_document(&doc))
            .ok_or_else(|| BooksError::NotFound(format!("lead status {}", id)))
    }

    pub fn create(&self, input: LeadStatusInput) -> Result<LeadStatus> {
        let name = required_name(input.name.as_deref())?;
        let _guard = self.writes.lock().unwrap();
        let existing = self.list()?;
        ensure_unique(&existing, &name, None)?;

        let order = match input.order {
            Some(order) => order,
            None => next_order(&existing)?,
        };
        let now = OffsetDateTime::now_utc();

        let mut fields = Fields::new();
        fields.insert(lead_status::NAME.into(), DataValue::from(name.as_str()));
        fields.insert(
            lead_status::COLOR.into(),
            DataValue::from(input.color.as_deref().unwrap_or(DEFAULT_COLOR)),
        );
        fields.insert(lead_status::ORDER.into(), DataValue::Int(order));
        fields.insert(lead_status::IS_DEFAULT.into(), DataValue::Bool(input.is_default.unwrap_or(false)));
        fields.insert(CREATED_AT.into(), DataValue::Timestamp(now));
        fields.insert(UPDATED_AT.into(), DataValue::Timestamp(now));

        let id = self.store.add(collections::LEAD_STATUSES, fields)?;
        tracing::info!(id = %id, name = %name, "Lead status created");
        self.get(&id)
    }

    /// Applies the fields present in `input`; absent fields stay unchanged.
    pub fn update(&self, id: &str, input: LeadStatusInput) -> Result<LeadStatus> {
        let _guard = self.writes.lock().unwrap();
        let mut fields = Fields::new();
        if let Some(name) = input.name.as_deref() {
            let name = required_name(Some(name))?;
            ensure_unique(&self.list()?, &name, Some(id))?;
            fields.insert(lead_status::NAME.into(), DataValue::from(name.as_str()));
        }
        if let Some(color) = input.color.as_deref() {
            fields.insert(lead_status::COLOR.into(), DataValue::from(color));
        }
        if let Some(order) = input.order {
            fields.insert(lead_status::ORDER.into(), DataValue::Int(order));
        }
        if let Some(is_default) = input.is_default {
            fields.insert(lead_status::IS_DEFAULT.into(), DataValue::Bool(is_default));
        }
        fields.insert(UPDATED_AT.into(), DataValue::Timestamp(OffsetDateTime::now_utc()));

        self.store
            .update(collections::LEAD_STATUSES, id, fields)
            .map_err(|e| not_found_or(e, id))?;
        self.get(id)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.store
            .delete(collections::LEAD_STATUSES, id)
            .map_err(|e| not_found_or(e, id))?;
        tracing::info!(id, "Lead status deleted");
        Ok(())
    }
}

/// One past the highest order in use, or 1 for the first status.
fn next_order(existing: &[LeadStatus]) -> Result<i64> {
    match existing.iter().map(|s| s.order).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| BooksError::Validation("no order left after the highest status; give one explicitly".to_string())),
    }
}

fn required_name(name: Option<&str>) -> Result<String> {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => Ok(n.to_string()),
        _ => Err(BooksError::Validation("name is required".to_string())),
    }
}

fn ensure_unique(existing: &[LeadStatus], name: &str, except_id: Option<&str>) -> Result<()> {
    let clash = existing
        .iter()
        .any(|s| Some(s.id.as_str()) != except_id && s.name.eq_ignore_ascii_case(name));
    if clash {
        return Err(BooksError::Validation(format!("lead status '{}' already exists", name)));
    }
    Ok(())
}

fn not_found_or(e: StoreError, id: &str) -> BooksError {
    match e {
        StoreError::DocumentNotFound { .. } => BooksError::NotFound(format!("lead status {}", id)),
        other => BooksError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn service() -> LeadStatusService {
        LeadStatusService::new(Arc::new(InMemoryStore::new()))
    }

    fn named(name: &str) -> LeadStatusInput {
        LeadStatusInput {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn create_assigns_increasing_order() {
        let svc = service();
        let a = svc.create(named("New")).unwrap();
        let b = svc.create(named(" Contacted ")).unwrap();
        assert_eq!(a.order, 1);
        assert_eq!(b.order, 2);
        assert_eq!(b.name, "Contacted");
        assert_eq!(b.color, DEFAULT_COLOR);

        let names: Vec<_> = svc.list().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["New", "Contacted"]);
    }

    #[test]
    fn order_after_the_maximum_is_rejected_not_wrapped() {
        let svc = service();
        svc.create(LeadStatusInput {
            order: Some(i64::MAX),
            ..named("Closed")
        })
        .unwrap();
        assert!(matches!(svc.create(named("Next")), Err(BooksError::Validation(_))));

        let explicit = svc
            .create(LeadStatusInput {
                order: Some(5),
                ..named("Next")
            })
            .unwrap();
        assert_eq!(explicit.order, 5);
        assert_eq!(svc.list().unwrap().len(), 2);
    }

    #[test]
    fn concurrent_creates_keep_names_unique() {
        let svc = Arc::new(service());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let svc = svc.clone();
                std::thread::spawn(move || svc.create(named(if i % 2 == 0 { "Hot" } else { "hot" })))
            })
            .collect();
        let created = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();
        assert_eq!(created, 1);
        assert_eq!(svc.list().unwrap().len(), 1);
    }

    #[test]
    fn names_are_required_and_unique() {
        let svc = service();
        svc.create(named("Won")).unwrap();
        assert!(matches!(svc.create(named("won")), Err(BooksError::Validation(_))));
        assert!(matches!(svc.create(named("   ")), Err(BooksError::Validation(_))));
        assert!(matches!(svc.create(LeadStatusInput::default()), Err(BooksError::Validation(_))));
    }

    #[test]
    fn update_and_delete() {
        let svc = service();
        let s = svc.create(named("Qualified")).unwrap();
        let updated = svc
            .update(&s.id, LeadStatusInput {
                color: Some("#00ff00".to_string()),
                order: Some(7),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.name, "Qualified");
        assert_eq!(updated.color, "#00ff00");
        assert_eq!(updated.order, 7);

        // renaming to its own name is not a clash
        svc.update(&s.id, named("qualified")).unwrap();

        svc.delete(&s.id).unwrap();
        assert!(matches!(svc.delete(&s.id), Err(BooksError::NotFound(_))));
        assert!(matches!(svc.update("missing", named("X")), Err(BooksError::NotFound(_))));
    }
}
