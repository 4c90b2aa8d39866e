//! Usage plans configured for apps.
//!
//! An app names its plan through [`AppState::plan_id`]. Unknown or missing
//! plan ids fall back to the smallest configured plan, and an empty
//! configuration means no limits at all.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::AppState;

/// Limits of one plan. `None` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPlan {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub max_api_calls: Option<u64>,
    #[serde(default)]
    pub max_asset_size: Option<u64>,
    #[serde(default)]
    pub max_contributors: Option<u64>,
}

impl AppPlan {
    /// The plan used when nothing is configured.
    pub fn infinite() -> Self {
        Self {
            id: None,
            name: "Infinite".to_string(),
            max_api_calls: None,
            max_asset_size: None,
            max_contributors: None,
        }
    }

    fn size_rank(&self) -> u64 {
        self.max_api_calls.unwrap_or(u64::MAX)
    }
}

/// Plans from configuration, smallest first.
#[derive(Debug, Clone)]
pub struct AppPlans {
    plans: Vec<AppPlan>,
    fallback: AppPlan,
}

impl AppPlans {
    pub fn new(plans: impl IntoIterator<Item = AppPlan>) -> Self {
        let mut plans: Vec<_> = plans.into_iter().collect();
        plans.sort_by_key(AppPlan::size_rank);

        let fallback = plans.first().cloned().unwrap_or_else(AppPlan::infinite);
        Self { plans, fallback }
    }

    /// Configured plans ordered by API call allowance.
    pub fn available(&self) -> &[AppPlan] {
        &self.plans
    }

    pub fn plan_for_app(&self, app: &AppState) -> &AppPlan {
        let configured = app
            .plan_id
            .as_deref()
            .and_then(|id| self.plans.iter().find(|plan| plan.id.as_deref() == Some(id)));

        configured.unwrap_or_else(|| {
            debug!(
                app = %app.id,
                plan = ?app.plan_id,
                fallback = %self.fallback.name,
                "plan not configured"
            );
            &self.fallback
        })
    }
}
