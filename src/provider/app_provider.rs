use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

use super::{into_found, AggregateLoader, AppProvider};
use crate::config::ProviderOptions;
use crate::error::StoreError;
use crate::id::DomainId;
use crate::repository::{AppRepository, RuleRepository, SchemaRepository};
use crate::state::{AppState, RuleState, SchemaState};

/// [`AppProvider`] that resolves ids through the repositories and loads every
/// aggregate through an [`AggregateLoader`].
///
/// Holds no cache: every call sees the stores' current versions.
pub struct SnapshotAppProvider<L> {
    loader: L,
    apps: Arc<dyn AppRepository>,
    schemas: Arc<dyn SchemaRepository>,
    rules: Arc<dyn RuleRepository>,
    options: ProviderOptions,
}

impl<L: AggregateLoader> SnapshotAppProvider<L> {
    pub fn new(
        loader: L,
        apps: Arc<dyn AppRepository>,
        schemas: Arc<dyn SchemaRepository>,
        rules: Arc<dyn RuleRepository>,
    ) -> Self {
        Self {
            loader,
            apps,
            schemas,
            rules,
            options: ProviderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ProviderOptions) -> Self {
        self.options = options;
        self
    }

    /// Run every load, then fan in. Output order follows input order; the first
    /// failure fails the whole batch.
    async fn load_all<T, Fut>(&self, loads: Vec<Fut>) -> Result<Vec<T>, StoreError>
    where
        Fut: Future<Output = Result<T, StoreError>> + Send,
        T: Send,
    {
        match self.options.max_concurrent_loads {
            Some(limit) if limit > 0 => stream::iter(loads).buffered(limit).try_collect().await,
            _ => try_join_all(loads).await,
        }
    }

    async fn load_schemas(
        &self,
        app_id: &DomainId,
        ids: &[DomainId],
        include_deleted: bool,
    ) -> Result<Vec<SchemaState>, StoreError> {
        let loads = ids
            .iter()
            .map(|id| async move {
                let loaded = self.loader.load_schema(app_id, id).await?;
                Ok::<_, StoreError>(into_found(loaded, include_deleted))
            })
            .collect();

        let schemas: Vec<Option<SchemaState>> = self.load_all(loads).await?;
        Ok(schemas.into_iter().flatten().collect())
    }
}

#[async_trait]
impl<L: AggregateLoader> AppProvider for SnapshotAppProvider<L> {
    async fn get_app_with_schema(
        &self,
        app_id: &DomainId,
        schema_id: &DomainId,
    ) -> Result<Option<(AppState, SchemaState)>, StoreError> {
        let (app, schema) = futures::try_join!(
            self.loader.load_app(app_id),
            self.loader.load_schema(app_id, schema_id)
        )?;

        match (into_found(app, false), into_found(schema, false)) {
            (Some(app), Some(schema)) => Ok(Some((app, schema))),
            (app, schema) => {
                debug!(
                    app_id = %app_id,
                    schema_id = %schema_id,
                    app_found = app.is_some(),
                    schema_found = schema.is_some(),
                    "app with schema not found"
                );
                Ok(None)
            }
        }
    }

    async fn get_app(&self, app_id: &DomainId) -> Result<Option<AppState>, StoreError> {
        let loaded = self.loader.load_app(app_id).await?;
        Ok(into_found(loaded, false))
    }

    async fn get_app_by_name(&self, name: &str) -> Result<Option<AppState>, StoreError> {
        let Some(app_id) = self.apps.find_app_id_by_name(name).await? else {
            return Ok(None);
        };
        self.get_app(&app_id).await
    }

    async fn get_schema(
        &self,
        app_id: &DomainId,
        schema_id: &DomainId,
        include_deleted: bool,
    ) -> Result<Option<SchemaState>, StoreError> {
        let loaded = self.loader.load_schema(app_id, schema_id).await?;
        Ok(into_found(loaded, include_deleted))
    }

    async fn get_schema_by_name(
        &self,
        app_id: &DomainId,
        name: &str,
        include_deleted: bool,
    ) -> Result<Option<SchemaState>, StoreError> {
        let ids = self
            .schemas
            .query_schema_ids_by_name(app_id, name, include_deleted)
            .await?;

        let candidates = self.load_schemas(app_id, &ids, include_deleted).await?;

        // Ties keep the earlier candidate.
        let newest = candidates
            .into_iter()
            .fold(None::<SchemaState>, |newest, schema| match newest {
                Some(current) if current.last_modified >= schema.last_modified => Some(current),
                _ => Some(schema),
            });

        if newest.is_none() {
            debug!(app_id = %app_id, name, "schema not found by name");
        }
        Ok(newest)
    }

    async fn get_schemas(&self, app_id: &DomainId) -> Result<Vec<SchemaState>, StoreError> {
        let ids = self.schemas.query_schema_ids(app_id).await?;
        self.load_schemas(app_id, &ids, false).await
    }

    async fn get_rules(&self, app_id: &DomainId) -> Result<Vec<RuleState>, StoreError> {
        let ids = self.rules.query_rule_ids(app_id).await?;
        let loads = ids
            .iter()
            .map(|id| async move {
                let loaded = self.loader.load_rule(app_id, id).await?;
                Ok::<_, StoreError>(into_found(loaded, false))
            })
            .collect();

        let rules: Vec<Option<RuleState>> = self.load_all(loads).await?;
        Ok(rules.into_iter().flatten().collect())
    }

    async fn get_user_apps(&self, user_id: &str) -> Result<Vec<AppState>, StoreError> {
        let ids = self.apps.query_user_app_ids(user_id).await?;
        let loads = ids
            .iter()
            .map(|id| async move {
                let loaded = self.loader.load_app(id).await?;
                Ok::<_, StoreError>(into_found(loaded, false))
            })
            .collect();

        let apps: Vec<Option<AppState>> = self.load_all(loads).await?;
        Ok(apps.into_iter().flatten().collect())
    }
}
