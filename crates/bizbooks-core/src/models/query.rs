use std::{cmp::Ordering, sync::Arc};

use super::{DataValue, Document};

/// A single filter applied to the documents of one collection. A query is a
/// conjunction of predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq { field: Arc<str>, value: DataValue },
    /// Inclusive on both ends.
    Range { field: Arc<str>, from: DataValue, to: DataValue },
}

impl Predicate {
    pub fn eq(field: impl Into<Arc<str>>, value: impl Into<DataValue>) -> Self {
        Predicate::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn between(field: impl Into<Arc<str>>, from: impl Into<DataValue>, to: impl Into<DataValue>) -> Self {
        Predicate::Range {
            field: field.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Predicate::Eq { field, .. } | Predicate::Range { field, .. } => field,
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Predicate::Eq { field, value } => match doc.field(field) {
                Some(actual) => match actual.compare(value) {
                    Some(ord) => ord == Ordering::Equal,
                    None => actual == value,
                },
                None => value.is_null(),
            },
            Predicate::Range { field, from, to } => match doc.field(field) {
                Some(actual) => {
                    matches!(actual.compare(from), Some(Ordering::Greater | Ordering::Equal))
                        && matches!(actual.compare(to), Some(Ordering::Less | Ordering::Equal))
                }
                None => false,
            },
        }
    }
}

pub fn matches_all(predicates: &[Predicate], doc: &Document) -> bool {
    predicates.iter().all(|p| p.matches(doc))
}
