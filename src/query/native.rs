//! Storage-native filters, evaluated by the storage engine against stored documents.
//!
//! Semantics follow document databases: a missing field never equals a
//! non-null value, so `Ne(path, v)` matches documents where `path` is absent,
//! and comparisons against array fields match when any element matches.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum StorageFilter {
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    Exists(String, bool),
    StartsWith(String, String),
    EndsWith(String, String),
    Contains(String, String),
    And(Vec<StorageFilter>),
    Or(Vec<StorageFilter>),
    Not(Box<StorageFilter>),
}

impl StorageFilter {
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        StorageFilter::Eq(path.into(), value.into())
    }

    pub fn ne(path: impl Into<String>, value: impl Into<Value>) -> Self {
        StorageFilter::Ne(path.into(), value.into())
    }

    pub fn is_in(path: impl Into<String>, values: Vec<Value>) -> Self {
        StorageFilter::In(path.into(), values)
    }

    pub fn exists(path: impl Into<String>) -> Self {
        StorageFilter::Exists(path.into(), true)
    }

    /// Conjunction; a single clause is returned unwrapped.
    pub fn and(mut filters: Vec<StorageFilter>) -> Self {
        if filters.len() == 1 {
            return filters.remove(0);
        }
        StorageFilter::And(filters)
    }

    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        match self {
            StorageFilter::Eq(path, expected) => field_equals(lookup(doc, path), expected),
            StorageFilter::Ne(path, expected) => !field_equals(lookup(doc, path), expected),
            StorageFilter::Gt(path, bound) => {
                field_compares(lookup(doc, path), bound, Ordering::is_gt)
            }
            StorageFilter::Gte(path, bound) => {
                field_compares(lookup(doc, path), bound, Ordering::is_ge)
            }
            StorageFilter::Lt(path, bound) => {
                field_compares(lookup(doc, path), bound, Ordering::is_lt)
            }
            StorageFilter::Lte(path, bound) => {
                field_compares(lookup(doc, path), bound, Ordering::is_le)
            }
            StorageFilter::In(path, values) => {
                let field = lookup(doc, path);
                values.iter().any(|v| field_equals(field, v))
            }
            StorageFilter::Exists(path, expected) => lookup(doc, path).is_some() == *expected,
            StorageFilter::StartsWith(path, prefix) => {
                field_text(lookup(doc, path), |s| s.starts_with(prefix.as_str()))
            }
            StorageFilter::EndsWith(path, suffix) => {
                field_text(lookup(doc, path), |s| s.ends_with(suffix.as_str()))
            }
            StorageFilter::Contains(path, needle) => {
                field_text(lookup(doc, path), |s| s.contains(needle.as_str()))
            }
            StorageFilter::And(children) => children.iter().all(|c| c.matches(doc)),
            StorageFilter::Or(children) => children.iter().any(|c| c.matches(doc)),
            StorageFilter::Not(inner) => !inner.matches(doc),
        }
    }

    /// The value of a top-level equality clause on `path`, if this filter has one.
    ///
    /// Used by the storage engine to pick candidates from a secondary index.
    pub fn equality_on(&self, path: &str) -> Option<&Value> {
        match self {
            StorageFilter::Eq(p, value) if p == path => Some(value),
            StorageFilter::And(children) => children.iter().find_map(|c| c.equality_on(path)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Options of a storage scan: ordering, limit and projection.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub sort: Vec<(String, SortOrder)>,
    pub limit: Option<usize>,
    /// Only these top-level fields are returned when set.
    pub projection: Option<Vec<String>>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_by(mut self, path: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((path.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn only(mut self, fields: &[&str]) -> Self {
        self.projection = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Order, truncate and project matched documents.
    pub fn apply(&self, mut docs: Vec<Map<String, Value>>) -> Vec<Map<String, Value>> {
        if !self.sort.is_empty() {
            docs.sort_by(|a, b| {
                for (path, order) in &self.sort {
                    let ordering = order_values(lookup(a, path), lookup(b, path));
                    let ordering = match order {
                        SortOrder::Ascending => ordering,
                        SortOrder::Descending => ordering.reverse(),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }

        match &self.projection {
            Some(fields) => docs
                .into_iter()
                .map(|doc| {
                    doc.into_iter()
                        .filter(|(key, _)| fields.iter().any(|f| f == key))
                        .collect()
                })
                .collect(),
            None => docs,
        }
    }
}

pub(crate) fn lookup<'a>(doc: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn field_equals(field: Option<&Value>, expected: &Value) -> bool {
    match field {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(value) => values_equal(value, expected),
    }
}

fn field_compares(field: Option<&Value>, bound: &Value, accept: fn(Ordering) -> bool) -> bool {
    match field {
        None => false,
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| compare_values(item, bound).is_some_and(accept)),
        Some(value) => compare_values(value, bound).is_some_and(accept),
    }
}

fn field_text(field: Option<&Value>, accept: impl Fn(&str) -> bool) -> bool {
    match field {
        Some(Value::String(s)) => accept(s),
        Some(Value::Array(items)) => items.iter().any(|item| item.as_str().is_some_and(&accept)),
        _ => false,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(x), Value::String(y)) => match (parse_datetime(x), parse_datetime(y)) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => match (parse_datetime(x), parse_datetime(y)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order used for sorting: missing and null first, then by type.
fn order_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or_else(|| rank(a).cmp(&rank(b))),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
