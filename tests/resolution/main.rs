//! Snapshot store, resolver, id query and enrichment integration tests.

mod provider;
mod query_ids;
mod snapshot_store;
