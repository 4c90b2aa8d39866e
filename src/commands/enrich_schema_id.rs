use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::context::CommandContext;
use super::error::CommandError;
use super::middleware::{CommandMiddleware, Next};
use crate::id::{DomainId, NamedId};
use crate::provider::AppProvider;

/// Fills a command's missing schema id from the route's `name` parameter.
///
/// Outside of a request, for commands without a schema slot, or when the slot
/// is already filled, the command passes through untouched. A route naming a
/// schema that cannot be resolved fails the command with `NotFound`.
pub struct EnrichWithSchemaId {
    app_provider: Arc<dyn AppProvider>,
}

impl EnrichWithSchemaId {
    pub fn new(app_provider: Arc<dyn AppProvider>) -> Self {
        Self { app_provider }
    }

    async fn resolve_schema(
        &self,
        context: &CommandContext,
    ) -> Result<Option<NamedId>, CommandError> {
        let Some(route) = context.route() else {
            return Ok(None);
        };

        let Some(app_id) = context
            .command()
            .app_id()
            .or_else(|| route.app())
            .map(|app| app.id.clone())
        else {
            return Ok(None);
        };

        let Some(name) = route.schema_name() else {
            return Ok(None);
        };

        let schema = match DomainId::parse_guid(name) {
            Some(schema_id) => self.app_provider.get_schema(&app_id, &schema_id, false).await?,
            None => self.app_provider.get_schema_by_name(&app_id, name, false).await?,
        };

        match schema {
            Some(schema) => Ok(Some(schema.named_id())),
            None => Err(CommandError::not_found("schema", name)),
        }
    }
}

#[async_trait]
impl CommandMiddleware for EnrichWithSchemaId {
    async fn handle(
        &self,
        context: &mut CommandContext,
        next: Next<'_>,
    ) -> Result<(), CommandError> {
        let needs_schema = context.route().is_some()
            && context
                .command_mut()
                .schema_slot()
                .is_some_and(|slot| !slot.is_filled());

        if needs_schema {
            if let Some(schema) = self.resolve_schema(context).await? {
                debug!(command = context.command().name(), schema = %schema, "schema id enriched");
                if let Some(slot) = context.command_mut().schema_slot() {
                    slot.fill(schema);
                }
            }
        }

        next.run(context).await
    }
}
