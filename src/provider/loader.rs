use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::id::DomainId;
use crate::snapshot::{SnapshotStore, Versioned};
use crate::state::{AppState, RuleState, SchemaState};

/// Loads single aggregates at their current version.
///
/// Passed explicitly to the resolver, so its lifetime is whatever the caller
/// (a request, a worker) decides.
#[async_trait]
pub trait AggregateLoader: Send + Sync {
    async fn load_app(&self, app_id: &DomainId) -> Result<Versioned<Option<AppState>>, StoreError>;

    async fn load_schema(
        &self,
        app_id: &DomainId,
        schema_id: &DomainId,
    ) -> Result<Versioned<Option<SchemaState>>, StoreError>;

    async fn load_rule(
        &self,
        app_id: &DomainId,
        rule_id: &DomainId,
    ) -> Result<Versioned<Option<RuleState>>, StoreError>;
}

/// Loader reading straight from the snapshot stores.
///
/// Apps are keyed by their id; schemas and rules by `DomainId::combine(app, id)`.
#[derive(Clone)]
pub struct SnapshotLoader {
    apps: Arc<dyn SnapshotStore<AppState>>,
    schemas: Arc<dyn SnapshotStore<SchemaState>>,
    rules: Arc<dyn SnapshotStore<RuleState>>,
}

impl SnapshotLoader {
    pub fn new(
        apps: Arc<dyn SnapshotStore<AppState>>,
        schemas: Arc<dyn SnapshotStore<SchemaState>>,
        rules: Arc<dyn SnapshotStore<RuleState>>,
    ) -> Self {
        Self {
            apps,
            schemas,
            rules,
        }
    }
}

#[async_trait]
impl AggregateLoader for SnapshotLoader {
    async fn load_app(&self, app_id: &DomainId) -> Result<Versioned<Option<AppState>>, StoreError> {
        self.apps.read(app_id).await
    }

    async fn load_schema(
        &self,
        app_id: &DomainId,
        schema_id: &DomainId,
    ) -> Result<Versioned<Option<SchemaState>>, StoreError> {
        self.schemas.read(&DomainId::combine(app_id, schema_id)).await
    }

    async fn load_rule(
        &self,
        app_id: &DomainId,
        rule_id: &DomainId,
    ) -> Result<Versioned<Option<RuleState>>, StoreError> {
        self.rules.read(&DomainId::combine(app_id, rule_id)).await
    }
}

#[async_trait]
impl<L: AggregateLoader + ?Sized> AggregateLoader for Arc<L> {
    async fn load_app(&self, app_id: &DomainId) -> Result<Versioned<Option<AppState>>, StoreError> {
        (**self).load_app(app_id).await
    }

    async fn load_schema(
        &self,
        app_id: &DomainId,
        schema_id: &DomainId,
    ) -> Result<Versioned<Option<SchemaState>>, StoreError> {
        (**self).load_schema(app_id, schema_id).await
    }

    async fn load_rule(
        &self,
        app_id: &DomainId,
        rule_id: &DomainId,
    ) -> Result<Versioned<Option<RuleState>>, StoreError> {
        (**self).load_rule(app_id, rule_id).await
    }
}
