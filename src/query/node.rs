use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// A predicate tree over logical field paths (e.g. `data.title.iv`, `lastModified`).
///
/// The node set is closed; translation passes match on it exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Compare {
        path: String,
        op: CompareOperator,
        value: FilterValue,
    },
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
    Not(Box<FilterNode>),
}

impl FilterNode {
    pub fn compare(
        path: impl Into<String>,
        op: CompareOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        FilterNode::Compare {
            path: path.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(path: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::compare(path, CompareOperator::Equals, value)
    }

    pub fn and(nodes: Vec<FilterNode>) -> Self {
        FilterNode::And(nodes)
    }

    pub fn or(nodes: Vec<FilterNode>) -> Self {
        FilterNode::Or(nodes)
    }

    pub fn negate(node: FilterNode) -> Self {
        FilterNode::Not(Box::new(node))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    In,
    StartsWith,
    EndsWith,
    Contains,
    Empty,
    Exists,
}

impl CompareOperator {
    pub fn name(self) -> &'static str {
        match self {
            CompareOperator::Equals => "eq",
            CompareOperator::NotEquals => "ne",
            CompareOperator::LessThan => "lt",
            CompareOperator::LessThanOrEqual => "le",
            CompareOperator::GreaterThan => "gt",
            CompareOperator::GreaterThanOrEqual => "ge",
            CompareOperator::In => "in",
            CompareOperator::StartsWith => "startsWith",
            CompareOperator::EndsWith => "endsWith",
            CompareOperator::Contains => "contains",
            CompareOperator::Empty => "empty",
            CompareOperator::Exists => "exists",
        }
    }

    /// Operators that only make sense on text.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            CompareOperator::StartsWith | CompareOperator::EndsWith | CompareOperator::Contains
        )
    }
}

/// Typed leaf value of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    DateTime(DateTime<Utc>),
    List(Vec<FilterValue>),
}

impl FilterValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FilterValue::Null => "null",
            FilterValue::Bool(_) => "boolean",
            FilterValue::Number(_) => "number",
            FilterValue::String(_) => "string",
            FilterValue::DateTime(_) => "datetime",
            FilterValue::List(_) => "list",
        }
    }

    /// Storage representation. Datetimes are stored as RFC 3339 strings.
    ///
    /// `None` when a number (possibly inside a list) is NaN or infinite, which
    /// has no storage form.
    pub fn to_json(&self) -> Option<Value> {
        let json = match self {
            FilterValue::Null => Value::Null,
            FilterValue::Bool(b) => Value::Bool(*b),
            FilterValue::Number(n) => Value::Number(serde_json::Number::from_f64(*n)?),
            FilterValue::String(s) => Value::String(s.clone()),
            FilterValue::DateTime(dt) => {
                Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            FilterValue::List(items) => Value::Array(
                items
                    .iter()
                    .map(FilterValue::to_json)
                    .collect::<Option<Vec<_>>>()?,
            ),
        };
        Some(json)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Number(value as f64)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        FilterValue::DateTime(value)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        FilterValue::List(values.into_iter().map(Into::into).collect())
    }
}
