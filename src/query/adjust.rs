//! Adjust a logical filter tree to a schema: logical paths become physical
//! storage paths and literals are coerced to the declared field types.

use chrono::{DateTime, Utc};

use super::node::{CompareOperator, FilterNode, FilterValue};
use crate::error::QueryError;
use crate::state::{FieldKind, SchemaDef, Status};

const DATA_PREFIX: &str = "data";
const DATA_PHYSICAL: &str = "do";
const DEFAULT_PARTITION: &str = "iv";

/// Resolve field names and coerce values against `schema`.
pub fn adjust_to_model(node: &FilterNode, schema: &SchemaDef) -> Result<FilterNode, QueryError> {
    match node {
        FilterNode::And(children) => Ok(FilterNode::And(adjust_all(children, schema)?)),
        FilterNode::Or(children) => Ok(FilterNode::Or(adjust_all(children, schema)?)),
        FilterNode::Not(inner) => Ok(FilterNode::Not(Box::new(adjust_to_model(inner, schema)?))),
        FilterNode::Compare { path, op, value } => {
            let (physical, kind) = resolve_path(path, schema)?;
            let value = coerce(path, *op, value, kind.as_ref())?;
            Ok(FilterNode::Compare {
                path: physical,
                op: *op,
                value,
            })
        }
    }
}

fn adjust_all(children: &[FilterNode], schema: &SchemaDef) -> Result<Vec<FilterNode>, QueryError> {
    children
        .iter()
        .map(|child| adjust_to_model(child, schema))
        .collect()
}

/// Physical path and declared kind. `None` kind means the value is taken as is.
fn resolve_path(path: &str, schema: &SchemaDef) -> Result<(String, Option<FieldKind>), QueryError> {
    let segments: Vec<&str> = path.split('.').collect();

    if segments.len() == 1 {
        return resolve_meta(path)
            .map(|(physical, kind)| (physical.to_string(), Some(kind)))
            .ok_or_else(|| QueryError::UnknownField(path.to_string()));
    }

    if segments[0] != DATA_PREFIX || segments[1].is_empty() {
        return Err(QueryError::UnknownField(path.to_string()));
    }

    let field = schema
        .field(segments[1])
        .ok_or_else(|| QueryError::UnknownField(path.to_string()))?;

    let partition = segments.get(2).copied().unwrap_or(DEFAULT_PARTITION);
    let nested = segments.get(3..).unwrap_or_default();

    let mut physical = format!("{}.{}.{}", DATA_PHYSICAL, field.name, partition);
    for segment in nested {
        physical.push('.');
        physical.push_str(segment);
    }

    match (&field.kind, nested.is_empty()) {
        (_, true) => Ok((physical, Some(field.kind.clone()))),
        (FieldKind::Json, false) => Ok((physical, None)),
        (_, false) => Err(QueryError::UnknownField(path.to_string())),
    }
}

fn resolve_meta(name: &str) -> Option<(&'static str, FieldKind)> {
    let resolved = match name {
        "id" => ("id", FieldKind::String),
        "created" => ("ct", FieldKind::DateTime),
        "createdBy" => ("cb", FieldKind::String),
        "lastModified" => ("mt", FieldKind::DateTime),
        "lastModifiedBy" => ("mb", FieldKind::String),
        "version" => ("vs", FieldKind::Number),
        "status" => (
            "st",
            FieldKind::Enum {
                allowed: Status::ALL.iter().map(|s| s.to_string()).collect(),
            },
        ),
        _ => return None,
    };
    Some(resolved)
}

fn coerce(
    path: &str,
    op: CompareOperator,
    value: &FilterValue,
    kind: Option<&FieldKind>,
) -> Result<FilterValue, QueryError> {
    let Some(kind) = kind else {
        return Ok(value.clone());
    };

    match op {
        CompareOperator::Exists | CompareOperator::Empty => Ok(value.clone()),
        CompareOperator::In => match value {
            FilterValue::List(items) => items
                .iter()
                .map(|item| coerce_scalar(path, item, kind))
                .collect::<Result<Vec<_>, _>>()
                .map(FilterValue::List),
            single => Ok(FilterValue::List(vec![coerce_scalar(path, single, kind)?])),
        },
        op if op.is_text() => {
            if !matches!(
                kind,
                FieldKind::String | FieldKind::Enum { .. } | FieldKind::References | FieldKind::Json
            ) {
                return Err(QueryError::UnsupportedOperator {
                    path: path.to_string(),
                    op: op.name(),
                });
            }
            match value {
                FilterValue::String(_) => Ok(value.clone()),
                other => Err(invalid(path, "string", other)),
            }
        }
        _ => coerce_scalar(path, value, kind),
    }
}

fn coerce_scalar(
    path: &str,
    value: &FilterValue,
    kind: &FieldKind,
) -> Result<FilterValue, QueryError> {
    if matches!(value, FilterValue::Null) {
        return Ok(FilterValue::Null);
    }

    match (kind, value) {
        (FieldKind::Json, _) => Ok(value.clone()),
        (FieldKind::Number, FilterValue::Number(n)) if n.is_finite() => Ok(value.clone()),
        (FieldKind::Number, FilterValue::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(FilterValue::Number)
            .ok_or_else(|| invalid(path, kind.name(), value)),
        (FieldKind::String | FieldKind::References, FilterValue::String(_)) => Ok(value.clone()),
        (FieldKind::String | FieldKind::References, FilterValue::Number(n)) => {
            Ok(FilterValue::String(n.to_string()))
        }
        (FieldKind::String | FieldKind::References, FilterValue::Bool(b)) => {
            Ok(FilterValue::String(b.to_string()))
        }
        (FieldKind::Boolean, FilterValue::Bool(_)) => Ok(value.clone()),
        (FieldKind::Boolean, FilterValue::String(s)) => match s.as_str() {
            "true" => Ok(FilterValue::Bool(true)),
            "false" => Ok(FilterValue::Bool(false)),
            _ => Err(invalid(path, kind.name(), value)),
        },
        (FieldKind::DateTime, FilterValue::DateTime(_)) => Ok(value.clone()),
        (FieldKind::DateTime, FilterValue::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| FilterValue::DateTime(dt.with_timezone(&Utc)))
            .map_err(|_| invalid(path, kind.name(), value)),
        (FieldKind::Enum { allowed }, FilterValue::String(s)) if allowed.contains(s) => {
            Ok(value.clone())
        }
        _ => Err(invalid(path, kind.name(), value)),
    }
}

fn invalid(path: &str, expected: &'static str, found: &FilterValue) -> QueryError {
    let found = match found {
        FilterValue::String(s) => format!("\"{}\"", s),
        other => other.type_name().to_string(),
    };
    QueryError::InvalidValue {
        path: path.to_string(),
        expected,
        found,
    }
}
