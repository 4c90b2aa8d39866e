//! Aggregate state persisted in the snapshot store.
//!
//! Every aggregate (apps, schemas, rules, contents, assets) implements
//! [`AggregateState`], which exposes what the store indexes and what the
//! resolver's found predicate needs. Load logic never depends on the concrete type.

mod app;
mod asset;
mod content;
mod rule;
mod schema;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::id::DomainId;

pub use app::AppState;
pub use asset::AssetState;
pub use content::{ContentData, ContentState, Status};
pub use rule::RuleState;
pub use schema::{FieldDef, FieldKind, SchemaDef, SchemaState};

/// Shared contract of all snapshot-backed aggregates.
pub trait AggregateState: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The aggregate kind (e.g., "app", "schema"), used in logs and errors.
    const KIND: &'static str;

    fn id(&self) -> &DomainId;

    /// The owning tenant. Apps return their own id.
    fn app_id(&self) -> &DomainId;

    /// The owning schema, for schema-scoped aggregates (schemas return their own id).
    fn schema_id(&self) -> Option<&DomainId> {
        None
    }

    /// Soft delete flag. Aggregates without a soft delete concept are never deleted.
    fn is_deleted(&self) -> bool {
        false
    }

    fn last_modified(&self) -> DateTime<Utc>;
}
