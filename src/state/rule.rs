use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AggregateState;
use crate::id::{DomainId, NamedId};

/// Snapshot of a rule. Rules have no soft delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleState {
    pub id: DomainId,
    pub app_id: NamedId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_enabled: bool,
    pub trigger: String,
    pub action: String,
    pub last_modified: DateTime<Utc>,
}

impl RuleState {
    pub fn new(
        id: DomainId,
        app_id: NamedId,
        trigger: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id,
            app_id,
            name: None,
            is_enabled: true,
            trigger: trigger.into(),
            action: action.into(),
            last_modified: Utc::now(),
        }
    }
}

impl AggregateState for RuleState {
    const KIND: &'static str = "rule";

    fn id(&self) -> &DomainId {
        &self.id
    }

    fn app_id(&self) -> &DomainId {
        &self.app_id.id
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }
}
