use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AggregateState;
use crate::id::{DomainId, NamedId};

/// Snapshot of an uploaded asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetState {
    pub id: DomainId,
    pub app_id: NamedId,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: u64,
    #[serde(default)]
    pub file_version: i64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub last_modified: DateTime<Utc>,
}

impl AssetState {
    pub fn new(
        id: DomainId,
        app_id: NamedId,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        file_size: u64,
    ) -> Self {
        Self {
            id,
            app_id,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            file_size,
            file_version: 0,
            tags: BTreeSet::new(),
            is_deleted: false,
            last_modified: Utc::now(),
        }
    }
}

impl AggregateState for AssetState {
    const KIND: &'static str = "asset";

    fn id(&self) -> &DomainId {
        &self.id
    }

    fn app_id(&self) -> &DomainId {
        &self.app_id.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }
}
