//! Aggregate resolution: tenant + id or name → loaded, visibility-filtered aggregate.
//!
//! Absence is `Ok(None)` (or an empty list); only storage faults are errors.
//!
//! ## Example
//!
//! ```ignore
//! let provider = SnapshotAppProvider::new(loader, apps, schemas, rules);
//! if let Some(schema) = provider.get_schema_by_name(&app_id, "orders", false).await? {
//!     // ...
//! }
//! ```

mod app_provider;
mod loader;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::id::DomainId;
use crate::snapshot::{EtagVersion, Versioned};
use crate::state::{AggregateState, AppState, RuleState, SchemaState};

pub use app_provider::SnapshotAppProvider;
pub use loader::{AggregateLoader, SnapshotLoader};

/// The found predicate: a committed snapshot exists and, unless
/// `include_deleted`, it is not soft-deleted.
pub fn is_found<T: AggregateState>(loaded: &Versioned<Option<T>>, include_deleted: bool) -> bool {
    loaded.version != EtagVersion::NOT_FOUND
        && loaded
            .data
            .as_ref()
            .is_some_and(|state| include_deleted || !state.is_deleted())
}

/// The state behind `loaded` when it passes [`is_found`].
pub fn into_found<T: AggregateState>(
    loaded: Versioned<Option<T>>,
    include_deleted: bool,
) -> Option<T> {
    if is_found(&loaded, include_deleted) {
        loaded.data
    } else {
        None
    }
}

#[async_trait]
pub trait AppProvider: Send + Sync {
    /// Both aggregates, or `None` when either one is not found.
    async fn get_app_with_schema(
        &self,
        app_id: &DomainId,
        schema_id: &DomainId,
    ) -> Result<Option<(AppState, SchemaState)>, StoreError>;

    async fn get_app(&self, app_id: &DomainId) -> Result<Option<AppState>, StoreError>;

    async fn get_app_by_name(&self, name: &str) -> Result<Option<AppState>, StoreError>;

    async fn get_schema(
        &self,
        app_id: &DomainId,
        schema_id: &DomainId,
        include_deleted: bool,
    ) -> Result<Option<SchemaState>, StoreError>;

    /// The most recently modified schema with this name that passes the found predicate.
    async fn get_schema_by_name(
        &self,
        app_id: &DomainId,
        name: &str,
        include_deleted: bool,
    ) -> Result<Option<SchemaState>, StoreError>;

    async fn get_schemas(&self, app_id: &DomainId) -> Result<Vec<SchemaState>, StoreError>;

    async fn get_rules(&self, app_id: &DomainId) -> Result<Vec<RuleState>, StoreError>;

    async fn get_user_apps(&self, user_id: &str) -> Result<Vec<AppState>, StoreError>;
}
