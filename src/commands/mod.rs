//! Command pipeline: commands, their context, middlewares and the schema
//! enrichment stage that runs before aggregate dispatch.
//!
//! ## Example
//!
//! ```ignore
//! let bus = CommandBus::new()
//!     .with(EnrichWithSchemaId::new(app_provider.clone()))
//!     .with(handler(|ctx| dispatch(ctx)));
//!
//! let mut route = RouteContext::new().with_app(app.named_id());
//! route.set(SCHEMA_NAME_PARAM, "orders");
//!
//! let context = CommandContext::new(Box::new(CreateContent::new(data))).with_route(route);
//! bus.publish(context).await?;
//! ```

mod command;
mod context;
mod enrich_schema_id;
mod error;
mod middleware;

pub use command::{
    BulkUpdateContents, BulkUpdateJob, BulkUpdateType, Command, CreateContent, PublishSchema,
    SchemaSlot,
};
pub use context::{CommandContext, RouteContext, SCHEMA_NAME_PARAM};
pub use enrich_schema_id::EnrichWithSchemaId;
pub use error::CommandError;
pub use middleware::{handler, CommandBus, CommandMiddleware, HandlerFn, Next};
