use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::SnapshotOptions;
use crate::error::StoreError;
use crate::id::DomainId;
use crate::provider::AppProvider;
use crate::query::{
    build_schema_filter, not_deleted, FilterNode, FilterScope, FindOptions, StorageFilter,
    APP_FIELD, SCHEMA_FIELD,
};
use crate::snapshot::{InMemorySnapshotStore, SnapshotStore, Versioned};
use crate::state::ContentState;

const KEY_FIELD: &str = "_id";
const ID_FIELD: &str = "id";

/// The identity pair of a stored content item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentIdentity {
    pub schema_id: DomainId,
    pub id: DomainId,
}

/// Content snapshot store plus the id queries the read side needs.
///
/// Contents are keyed by `DomainId::combine(app, id)`.
#[derive(Clone)]
pub struct ContentRepository {
    snapshots: InMemorySnapshotStore<ContentState>,
    app_provider: Arc<dyn AppProvider>,
}

impl ContentRepository {
    pub fn new(app_provider: Arc<dyn AppProvider>) -> Self {
        Self::with_options(app_provider, SnapshotOptions::default())
    }

    pub fn with_options(app_provider: Arc<dyn AppProvider>, options: SnapshotOptions) -> Self {
        Self {
            snapshots: InMemorySnapshotStore::with_options(options),
            app_provider,
        }
    }

    /// Identities of the live contents among `ids`. Unknown ids are skipped.
    pub async fn query_ids_by_ids(
        &self,
        app_id: &DomainId,
        ids: &HashSet<DomainId>,
    ) -> Result<Vec<ContentIdentity>, StoreError> {
        let keys = ids
            .iter()
            .map(|id| Value::String(DomainId::combine(app_id, id).to_string()))
            .collect();

        let filter = StorageFilter::and(vec![
            StorageFilter::is_in(KEY_FIELD, keys),
            StorageFilter::eq(APP_FIELD, app_id.as_str()),
            not_deleted(),
        ]);

        self.identities(&filter).await
    }

    /// Identities of the live contents of a schema matching `filter`.
    ///
    /// A schema that is missing or deleted yields no ids.
    pub async fn query_ids(
        &self,
        app_id: &DomainId,
        schema_id: &DomainId,
        filter: Option<&FilterNode>,
    ) -> Result<Vec<ContentIdentity>, StoreError> {
        let Some(schema) = self.app_provider.get_schema(app_id, schema_id, false).await? else {
            debug!(app_id = %app_id, schema_id = %schema_id, "querying ids of unknown schema");
            return Ok(Vec::new());
        };

        let scope = FilterScope::schema(app_id.clone(), schema_id.clone());
        let filter = build_schema_filter(filter, &schema.schema_def, &scope)?;

        self.identities(&filter).await
    }

    async fn identities(&self, filter: &StorageFilter) -> Result<Vec<ContentIdentity>, StoreError> {
        let docs = self
            .snapshots
            .find(filter, &FindOptions::new().only(&[ID_FIELD, SCHEMA_FIELD]))
            .await?;
        docs.iter().map(identity_of).collect()
    }
}

fn identity_of(doc: &Map<String, Value>) -> Result<ContentIdentity, StoreError> {
    let field = |name: &str| {
        doc.get(name)
            .and_then(Value::as_str)
            .map(DomainId::new)
            .ok_or_else(|| StoreError::Serde(format!("content document without {name}")))
    };

    Ok(ContentIdentity {
        schema_id: field(SCHEMA_FIELD)?,
        id: field(ID_FIELD)?,
    })
}

#[async_trait]
impl SnapshotStore<ContentState> for ContentRepository {
    async fn read(&self, key: &DomainId) -> Result<Versioned<Option<ContentState>>, StoreError> {
        self.snapshots.read(key).await
    }

    async fn write(
        &self,
        key: &DomainId,
        value: &ContentState,
        expected_version: i64,
        new_version: i64,
    ) -> Result<(), StoreError> {
        self.snapshots
            .write(key, value, expected_version, new_version)
            .await
    }

    fn read_all(
        &self,
        ct: CancellationToken,
    ) -> BoxStream<'_, Result<Versioned<ContentState>, StoreError>> {
        self.snapshots.read_all(ct)
    }

    async fn remove(&self, key: &DomainId) -> Result<(), StoreError> {
        self.snapshots.remove(key).await
    }
}
