use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AggregateState;
use crate::id::{DomainId, NamedId};

/// Content data: field name to partition (e.g. "iv", "en") to value.
pub type ContentData = BTreeMap<String, BTreeMap<String, Value>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Draft,
    Published,
    Archived,
}

impl Status {
    pub const ALL: [&'static str; 3] = ["Draft", "Published", "Archived"];
}

/// Snapshot of a content item.
///
/// Field names are the physical storage names the filter builder targets
/// (`do.<field>.<partition>`, `mt`, `st`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentState {
    pub id: DomainId,
    #[serde(rename = "ai")]
    pub app_id: NamedId,
    #[serde(rename = "si")]
    pub schema_id: NamedId,
    #[serde(rename = "do", default)]
    pub data: ContentData,
    #[serde(rename = "st", default)]
    pub status: Status,
    #[serde(rename = "ct")]
    pub created: DateTime<Utc>,
    #[serde(rename = "cb")]
    pub created_by: String,
    #[serde(rename = "mt")]
    pub last_modified: DateTime<Utc>,
    #[serde(rename = "mb")]
    pub last_modified_by: String,
    #[serde(rename = "dl", default)]
    pub is_deleted: bool,
}

impl ContentState {
    pub fn new(
        id: DomainId,
        app_id: NamedId,
        schema_id: NamedId,
        actor: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let actor = actor.into();
        Self {
            id,
            app_id,
            schema_id,
            data: ContentData::new(),
            status: Status::Draft,
            created: now,
            created_by: actor.clone(),
            last_modified: now,
            last_modified_by: actor,
            is_deleted: false,
        }
    }

    /// Set the invariant ("iv") partition of a field.
    pub fn with_value(mut self, field: impl Into<String>, value: Value) -> Self {
        self.data
            .entry(field.into())
            .or_default()
            .insert("iv".to_string(), value);
        self
    }
}

impl AggregateState for ContentState {
    const KIND: &'static str = "content";

    fn id(&self) -> &DomainId {
        &self.id
    }

    fn app_id(&self) -> &DomainId {
        &self.app_id.id
    }

    fn schema_id(&self) -> Option<&DomainId> {
        Some(&self.schema_id.id)
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }
}
