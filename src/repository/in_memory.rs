use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use super::{AppRepository, RuleRepository, SchemaRepository};
use crate::error::StoreError;
use crate::id::DomainId;
use crate::query::{
    build_filter, not_deleted, FilterNode, FilterScope, FindOptions, SortOrder, StorageFilter,
    APP_FIELD,
};
use crate::snapshot::InMemorySnapshotStore;
use crate::state::{AppState, RuleState, SchemaState};

const LAST_MODIFIED: &str = "lastModified";

fn ids_of(docs: Vec<Map<String, Value>>) -> Vec<DomainId> {
    docs.into_iter()
        .filter_map(|doc| doc.get("id").and_then(Value::as_str).map(DomainId::new))
        .collect()
}

fn newest_first() -> FindOptions {
    FindOptions::new()
        .sort_by(LAST_MODIFIED, SortOrder::Descending)
        .only(&["id"])
}

/// App lookups over the app snapshot collection.
#[derive(Clone)]
pub struct InMemoryAppRepository {
    snapshots: InMemorySnapshotStore<AppState>,
}

impl InMemoryAppRepository {
    pub fn new(snapshots: InMemorySnapshotStore<AppState>) -> Self {
        Self { snapshots }
    }
}

#[async_trait]
impl AppRepository for InMemoryAppRepository {
    async fn find_app_id_by_name(&self, name: &str) -> Result<Option<DomainId>, StoreError> {
        let filter = StorageFilter::and(vec![StorageFilter::eq("name", name), not_deleted()]);
        let docs = self.snapshots.find(&filter, &newest_first().limit(1)).await?;

        let id = ids_of(docs).into_iter().next();
        if id.is_none() {
            debug!(name, "no app with this name");
        }
        Ok(id)
    }

    async fn query_user_app_ids(&self, user_id: &str) -> Result<Vec<DomainId>, StoreError> {
        let filter = StorageFilter::and(vec![
            StorageFilter::exists(format!("contributors.{user_id}")),
            not_deleted(),
        ]);
        let docs = self.snapshots.find(&filter, &newest_first()).await?;
        Ok(ids_of(docs))
    }
}

/// Schema lookups over the schema snapshot collection.
#[derive(Clone)]
pub struct InMemorySchemaRepository {
    snapshots: InMemorySnapshotStore<SchemaState>,
}

impl InMemorySchemaRepository {
    pub fn new(snapshots: InMemorySnapshotStore<SchemaState>) -> Self {
        Self { snapshots }
    }
}

#[async_trait]
impl SchemaRepository for InMemorySchemaRepository {
    async fn query_schema_ids(&self, app_id: &DomainId) -> Result<Vec<DomainId>, StoreError> {
        let filter = build_filter(None, &FilterScope::app(app_id.clone()))?;
        let docs = self
            .snapshots
            .find(&filter, &FindOptions::new().only(&["id"]))
            .await?;
        Ok(ids_of(docs))
    }

    async fn query_schema_ids_by_name(
        &self,
        app_id: &DomainId,
        name: &str,
        include_deleted: bool,
    ) -> Result<Vec<DomainId>, StoreError> {
        let filter = if include_deleted {
            StorageFilter::and(vec![
                StorageFilter::eq(APP_FIELD, app_id.as_str()),
                StorageFilter::eq("name", name),
            ])
        } else {
            build_filter(
                Some(&FilterNode::eq("name", name)),
                &FilterScope::app(app_id.clone()),
            )?
        };

        let docs = self.snapshots.find(&filter, &newest_first()).await?;
        Ok(ids_of(docs))
    }
}

/// Rule lookups over the rule snapshot collection.
#[derive(Clone)]
pub struct InMemoryRuleRepository {
    snapshots: InMemorySnapshotStore<RuleState>,
}

impl InMemoryRuleRepository {
    pub fn new(snapshots: InMemorySnapshotStore<RuleState>) -> Self {
        Self { snapshots }
    }
}

#[async_trait]
impl RuleRepository for InMemoryRuleRepository {
    async fn query_rule_ids(&self, app_id: &DomainId) -> Result<Vec<DomainId>, StoreError> {
        let filter = build_filter(None, &FilterScope::app(app_id.clone()))?;
        let docs = self
            .snapshots
            .find(&filter, &FindOptions::new().only(&["id"]))
            .await?;
        Ok(ids_of(docs))
    }
}
