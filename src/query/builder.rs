use serde_json::Value;

use super::adjust::adjust_to_model;
use super::native::StorageFilter;
use super::node::{CompareOperator, FilterNode, FilterValue};
use crate::error::QueryError;
use crate::id::DomainId;
use crate::state::SchemaDef;

/// Indexed tenant id of a stored document.
pub const APP_FIELD: &str = "_ai";
/// Indexed schema id of a stored document.
pub const SCHEMA_FIELD: &str = "_si";
/// Soft delete flag. Absent means not deleted.
pub const DELETED_FIELD: &str = "dl";

/// Tenant and optional schema a query is confined to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterScope {
    pub app_id: DomainId,
    pub schema_id: Option<DomainId>,
}

impl FilterScope {
    pub fn app(app_id: DomainId) -> Self {
        Self {
            app_id,
            schema_id: None,
        }
    }

    pub fn schema(app_id: DomainId, schema_id: DomainId) -> Self {
        Self {
            app_id,
            schema_id: Some(schema_id),
        }
    }
}

/// The visibility clause shared by every scoped query.
pub fn not_deleted() -> StorageFilter {
    StorageFilter::ne(DELETED_FIELD, true)
}

/// Build the storage filter for an already adjusted node.
///
/// The result always carries the scope equality clauses and the not-deleted
/// clause, whatever the caller's node says.
pub fn build_filter(
    node: Option<&FilterNode>,
    scope: &FilterScope,
) -> Result<StorageFilter, QueryError> {
    let mut filters = Vec::with_capacity(4);

    if let Some(schema_id) = &scope.schema_id {
        filters.push(StorageFilter::eq(SCHEMA_FIELD, schema_id.as_str()));
    }
    filters.push(StorageFilter::eq(APP_FIELD, scope.app_id.as_str()));
    filters.push(not_deleted());

    if let Some(node) = node {
        filters.push(translate(node)?);
    }

    Ok(StorageFilter::and(filters))
}

/// Adjust `node` to `schema`, then build the scoped filter.
pub fn build_schema_filter(
    node: Option<&FilterNode>,
    schema: &SchemaDef,
    scope: &FilterScope,
) -> Result<StorageFilter, QueryError> {
    let adjusted = node.map(|n| adjust_to_model(n, schema)).transpose()?;
    build_filter(adjusted.as_ref(), scope)
}

/// Translate an adjusted node into its storage-native form.
pub fn translate(node: &FilterNode) -> Result<StorageFilter, QueryError> {
    let filter = match node {
        FilterNode::And(children) => StorageFilter::And(translate_all(children)?),
        FilterNode::Or(children) => StorageFilter::Or(translate_all(children)?),
        FilterNode::Not(inner) => StorageFilter::Not(Box::new(translate(inner)?)),
        FilterNode::Compare { path, op, value } => translate_compare(path, *op, value)?,
    };
    Ok(filter)
}

fn translate_all(nodes: &[FilterNode]) -> Result<Vec<StorageFilter>, QueryError> {
    nodes.iter().map(translate).collect()
}

fn translate_compare(
    path: &str,
    op: CompareOperator,
    value: &FilterValue,
) -> Result<StorageFilter, QueryError> {
    let json = || storage_value(path, value);
    let path = path.to_string();
    let filter = match op {
        CompareOperator::Equals => StorageFilter::Eq(path, json()?),
        CompareOperator::NotEquals => StorageFilter::Ne(path, json()?),
        CompareOperator::LessThan => StorageFilter::Lt(path, json()?),
        CompareOperator::LessThanOrEqual => StorageFilter::Lte(path, json()?),
        CompareOperator::GreaterThan => StorageFilter::Gt(path, json()?),
        CompareOperator::GreaterThanOrEqual => StorageFilter::Gte(path, json()?),
        CompareOperator::In => {
            let values = match json()? {
                Value::Array(items) if matches!(value, FilterValue::List(_)) => items,
                single => vec![single],
            };
            StorageFilter::In(path, values)
        }
        CompareOperator::StartsWith => StorageFilter::StartsWith(path, text(value)),
        CompareOperator::EndsWith => StorageFilter::EndsWith(path, text(value)),
        CompareOperator::Contains => StorageFilter::Contains(path, text(value)),
        CompareOperator::Exists => {
            let expected = !matches!(value, FilterValue::Bool(false));
            StorageFilter::Exists(path, expected)
        }
        CompareOperator::Empty => StorageFilter::Or(vec![
            StorageFilter::Exists(path.clone(), false),
            StorageFilter::Eq(path.clone(), Value::Null),
            StorageFilter::Eq(path.clone(), Value::String(String::new())),
            StorageFilter::Eq(path, Value::Array(Vec::new())),
        ]),
    };
    Ok(filter)
}

fn storage_value(path: &str, value: &FilterValue) -> Result<Value, QueryError> {
    value.to_json().ok_or_else(|| QueryError::InvalidValue {
        path: path.to_string(),
        expected: "finite number",
        found: "non-finite number".to_string(),
    })
}

fn text(value: &FilterValue) -> String {
    match value {
        FilterValue::String(s) => s.clone(),
        other => match other.to_json() {
            Some(Value::String(s)) => s,
            Some(json) => json.to_string(),
            None => String::new(),
        },
    }
}
