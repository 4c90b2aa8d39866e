//! Persistence and resolution layer for a multi-tenant, event-sourced content platform.
//!
//! Aggregates (apps, schemas, rules, contents, assets) are read from a
//! versioned snapshot store instead of replaying their event history. On top of
//! it sit a tenant-scoped filter builder, a resolver that loads aggregates by
//! id or by name, and a command middleware that fills missing schema ids.

pub mod assets;
pub mod commands;
pub mod config;
pub mod contents;
mod error;
pub mod id;
pub mod logging;
pub mod plans;
pub mod provider;
pub mod query;
pub mod repository;
pub mod snapshot;
pub mod state;

pub use config::StateOptions;
pub use error::{ConfigError, QueryError, StoreError};
pub use id::{DomainId, NamedId};
pub use provider::{AppProvider, SnapshotAppProvider, SnapshotLoader};
pub use snapshot::{EtagVersion, InMemorySnapshotStore, SnapshotStore, Versioned};
