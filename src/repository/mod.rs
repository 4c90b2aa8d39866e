//! Id lookups that back the resolver: name → id, user → apps, tenant → ids.
//!
//! Repositories only answer with ids; the aggregates themselves are always
//! loaded through the snapshot store.

mod in_memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::id::DomainId;

pub use in_memory::{InMemoryAppRepository, InMemoryRuleRepository, InMemorySchemaRepository};

#[async_trait]
pub trait AppRepository: Send + Sync {
    /// Id of the most recently modified live app with this name.
    async fn find_app_id_by_name(&self, name: &str) -> Result<Option<DomainId>, StoreError>;

    /// Ids of the live apps the user contributes to.
    async fn query_user_app_ids(&self, user_id: &str) -> Result<Vec<DomainId>, StoreError>;
}

#[async_trait]
pub trait SchemaRepository: Send + Sync {
    /// Ids of the live schemas of a tenant.
    async fn query_schema_ids(&self, app_id: &DomainId) -> Result<Vec<DomainId>, StoreError>;

    /// Ids of every schema of a tenant carrying `name`, most recently modified first.
    ///
    /// Names can be reused once a schema is deleted, so more than one id may come back.
    async fn query_schema_ids_by_name(
        &self,
        app_id: &DomainId,
        name: &str,
        include_deleted: bool,
    ) -> Result<Vec<DomainId>, StoreError>;
}

#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn query_rule_ids(&self, app_id: &DomainId) -> Result<Vec<DomainId>, StoreError>;
}
