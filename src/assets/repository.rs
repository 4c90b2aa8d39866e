use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::SnapshotOptions;
use crate::error::StoreError;
use crate::id::DomainId;
use crate::query::{build_filter, FilterScope, FindOptions};
use crate::snapshot::{InMemorySnapshotStore, SnapshotStore, Versioned};
use crate::state::AssetState;

/// Asset snapshot store, keyed by the plain storage key string.
#[derive(Clone, Default)]
pub struct AssetRepository {
    snapshots: InMemorySnapshotStore<AssetState>,
}

impl AssetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SnapshotOptions) -> Self {
        Self {
            snapshots: InMemorySnapshotStore::with_options(options),
        }
    }

    /// Ids of the live assets of a tenant.
    pub async fn query_ids(&self, app_id: &DomainId) -> Result<Vec<DomainId>, StoreError> {
        let filter = build_filter(None, &FilterScope::app(app_id.clone()))?;
        let docs = self
            .snapshots
            .find(&filter, &FindOptions::new().only(&["id"]))
            .await?;

        Ok(docs
            .iter()
            .filter_map(|doc| doc.get("id").and_then(Value::as_str).map(DomainId::new))
            .collect())
    }
}

#[async_trait]
impl SnapshotStore<AssetState, String> for AssetRepository {
    async fn read(&self, key: &String) -> Result<Versioned<Option<AssetState>>, StoreError> {
        self.snapshots.read(&DomainId::new(key.as_str())).await
    }

    async fn write(
        &self,
        key: &String,
        value: &AssetState,
        expected_version: i64,
        new_version: i64,
    ) -> Result<(), StoreError> {
        self.snapshots
            .write(&DomainId::new(key.as_str()), value, expected_version, new_version)
            .await
    }

    fn read_all(
        &self,
        ct: CancellationToken,
    ) -> BoxStream<'_, Result<Versioned<AssetState>, StoreError>> {
        self.snapshots.read_all(ct)
    }

    async fn remove(&self, key: &String) -> Result<(), StoreError> {
        self.snapshots.remove(&DomainId::new(key.as_str())).await
    }
}
