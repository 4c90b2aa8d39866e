//! Filter building: from a caller's predicate tree to a tenant-scoped,
//! soft-delete aware storage filter.
//!
//! ## Example
//!
//! ```ignore
//! use sourced_state::query::{build_schema_filter, CompareOperator, FilterNode, FilterScope};
//!
//! let node = FilterNode::compare("data.amount", CompareOperator::GreaterThan, 10i64);
//! let scope = FilterScope::schema(app_id, schema_id);
//! let filter = build_schema_filter(Some(&node), &schema.schema_def, &scope)?;
//! ```

mod adjust;
mod builder;
mod native;
mod node;

pub use adjust::adjust_to_model;
pub use builder::{
    build_filter, build_schema_filter, not_deleted, translate, FilterScope, APP_FIELD,
    DELETED_FIELD, SCHEMA_FIELD,
};
pub use native::{FindOptions, SortOrder, StorageFilter};
pub use node::{CompareOperator, FilterNode, FilterValue};
