use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AggregateState;
use crate::id::{DomainId, NamedId};

/// Snapshot of an app (the tenant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub id: DomainId,
    pub name: String,
    /// Contributor user id to role.
    #[serde(default)]
    pub contributors: BTreeMap<String, String>,
    #[serde(default)]
    pub plan_id: Option<String>,
    /// Archived apps are the soft-deleted apps.
    #[serde(default)]
    pub is_archived: bool,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl AppState {
    pub fn new(id: DomainId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            contributors: BTreeMap::new(),
            plan_id: None,
            is_archived: false,
            created: now,
            last_modified: now,
        }
    }

    pub fn with_contributor(mut self, user_id: impl Into<String>, role: impl Into<String>) -> Self {
        self.contributors.insert(user_id.into(), role.into());
        self
    }

    pub fn named_id(&self) -> NamedId {
        NamedId::new(self.id.clone(), self.name.clone())
    }
}

impl AggregateState for AppState {
    const KIND: &'static str = "app";

    fn id(&self) -> &DomainId {
        &self.id
    }

    fn app_id(&self) -> &DomainId {
        &self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_archived
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }
}
