use std::{cmp::Ordering, collections::BTreeMap, fmt::Display, str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};

pub mod query;

pub type Fields = BTreeMap<Arc<str>, DataValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    Null,
    Bool(bool),
    Int(i64),
    Money(Decimal),
    String(Arc<str>),
    Date(Date),
    Timestamp(OffsetDateTime),
    List(Vec<DataValue>),
    Map(Fields),
}

impl DataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// Numeric view of the value. Strings holding a number are accepted,
    /// everything else is `None`.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            DataValue::Money(m) => Some(*m),
            DataValue::Int(i) => Some(Decimal::from(*i)),
            DataValue::String(s) => parse_decimal(s.trim()),
            _ => None,
        }
    }

    /// Safe numeric coercion: anything that isn't a number is zero.
    pub fn decimal_or_zero(&self) -> Decimal {
        self.as_decimal().unwrap_or(Decimal::ZERO)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Date> {
        match self {
            DataValue::Date(d) => Some(*d),
            DataValue::Timestamp(ts) => Some(ts.date()),
            DataValue::String(s) => parse_date(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DataValue]> {
        match self {
            DataValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            DataValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Ordering between comparable values. Numbers compare across `Int` and
    /// `Money`, dates compare against the date part of timestamps.
    pub fn compare(&self, other: &DataValue) -> Option<Ordering> {
        match (self, other) {
            (DataValue::Null, DataValue::Null) => Some(Ordering::Equal),
            (DataValue::Bool(a), DataValue::Bool(b)) => Some(a.cmp(b)),
            (DataValue::Int(a), DataValue::Int(b)) => Some(a.cmp(b)),
            (DataValue::Int(_) | DataValue::Money(_), DataValue::Int(_) | DataValue::Money(_)) => {
                Some(self.as_decimal()?.cmp(&other.as_decimal()?))
            }
            (DataValue::String(a), DataValue::String(b)) => Some(a.cmp(b)),
            (DataValue::Date(a), DataValue::Date(b)) => Some(a.cmp(b)),
            (DataValue::Timestamp(a), DataValue::Timestamp(b)) => Some(a.cmp(b)),
            (DataValue::Date(a), DataValue::Timestamp(b)) => Some(a.cmp(&b.date())),
            (DataValue::Timestamp(a), DataValue::Date(b)) => Some(a.date().cmp(b)),
            _ => None,
        }
    }

    pub fn from_json(value: serde_json::Value) -> DataValue {
        match value {
            serde_json::Value::Null => DataValue::Null,
            serde_json::Value::Bool(b) => DataValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => DataValue::Int(i),
                None => parse_decimal(&n.to_string())
                    .map(DataValue::Money)
                    .unwrap_or(DataValue::Null),
            },
            serde_json::Value::String(s) => DataValue::String(s.into()),
            serde_json::Value::Array(items) => {
                DataValue::List(items.into_iter().map(DataValue::from_json).collect())
            }
            serde_json::Value::Object(map) => DataValue::Map(
                map.into_iter()
                    .map(|(k, v)| (Arc::from(k.as_str()), DataValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            DataValue::Null => serde_json::Value::Null,
            DataValue::Bool(b) => serde_json::Value::Bool(*b),
            DataValue::Int(i) => serde_json::Value::from(*i),
            // Strings keep full decimal precision and match serde's `Decimal` output.
            DataValue::Money(m) => serde_json::Value::String(m.to_string()),
            DataValue::String(s) => serde_json::Value::String(s.to_string()),
            DataValue::Date(_) | DataValue::Timestamp(_) => serde_json::Value::String(self.to_string()),
            DataValue::List(l) => serde_json::Value::Array(l.iter().map(DataValue::to_json).collect()),
            DataValue::Map(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.to_string(), v.to_json())).collect(),
            ),
        }
    }
}

impl Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataValue::Null => f.write_str("null"),
            DataValue::Bool(b) => write!(f, "{}", b),
            DataValue::Int(i) => write!(f, "{}", i),
            DataValue::Money(m) => write!(f, "{}", m),
            DataValue::String(s) => f.write_str(s),
            DataValue::Date(d) => write!(f, "{:04}-{:02}-{:02}", d.year(), d.month() as u8, d.day()),
            DataValue::Timestamp(ts) => match ts.format(&Rfc3339) {
                Ok(s) => f.write_str(&s),
                Err(_) => write!(f, "{}", ts),
            },
            DataValue::List(l) => write!(f, "{:?}", l),
            DataValue::Map(m) => write!(f, "{:?}", m),
        }
    }
}

impl From<Decimal> for DataValue {
    fn from(value: Decimal) -> Self {
        DataValue::Money(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.into())
    }
}

impl From<Arc<str>> for DataValue {
    fn from(value: Arc<str>) -> Self {
        DataValue::String(value)
    }
}

impl From<Date> for DataValue {
    fn from(value: Date) -> Self {
        DataValue::Date(value)
    }
}

impl From<OffsetDateTime> for DataValue {
    fn from(value: OffsetDateTime) -> Self {
        DataValue::Timestamp(value)
    }
}

pub fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)).ok()
}

/// Parses `YYYY-MM-DD`, also accepting the date prefix of an RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Option<Date> {
    let s = s.trim();
    if let Ok(d) = Date::parse(s, format_description!("[year]-[month]-[day]")) {
        return Some(d);
    }
    OffsetDateTime::parse(s, &Rfc3339).ok().map(|ts| ts.date())
}

/// A stored document: its identifier plus a map of named fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Arc<str>,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<Arc<str>>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Field value, treating an explicit null the same as a missing field.
    pub fn field(&self, name: &str) -> Option<&DataValue> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    pub fn has(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn decimal_or_zero(&self, name: &str) -> Decimal {
        self.field(name).map(DataValue::decimal_or_zero).unwrap_or(Decimal::ZERO)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(DataValue::as_str)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.field(name).and_then(DataValue::as_bool).unwrap_or(false)
    }

    /// JSON object with the document fields plus `id`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        obj.insert("id".to_string(), serde_json::Value::String(self.id.to_string()));
        for (k, v) in &self.fields {
            obj.insert(k.to_string(), v.to_json());
        }
        serde_json::Value::Object(obj)
    }
}

/// Builds a field map from `(name, value)` pairs.
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Arc<str>>,
    V: Into<DataValue>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
