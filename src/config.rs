//! Runtime options.
//!
//! Every field has a default, so an empty document (or no configuration at
//! all) yields a working setup. Environment variables override file values.

use std::env;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::plans::{AppPlan, AppPlans};

const ENV_MAX_CONCURRENT_LOADS: &str = "SOURCED_STATE_MAX_CONCURRENT_LOADS";
const ENV_SCAN_YIELD_EVERY: &str = "SOURCED_STATE_SCAN_YIELD_EVERY";

pub const DEFAULT_SCAN_YIELD_EVERY: usize = 256;

fn default_scan_yield_every() -> usize {
    DEFAULT_SCAN_YIELD_EVERY
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateOptions {
    pub provider: ProviderOptions,
    pub snapshots: SnapshotOptions,
    /// Usage plans apps can be on. Empty means unlimited.
    pub plans: Vec<AppPlan>,
}

/// Options of the aggregate resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderOptions {
    /// Upper bound of aggregate loads in flight for one batch. `None` loads all at once.
    pub max_concurrent_loads: Option<usize>,
}

/// Options of the in-memory snapshot store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnapshotOptions {
    /// Rows delivered by a full scan between cooperative yields to the scheduler.
    #[serde(default = "default_scan_yield_every")]
    pub scan_yield_every: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            scan_yield_every: DEFAULT_SCAN_YIELD_EVERY,
        }
    }
}

impl StateOptions {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn app_plans(&self) -> AppPlans {
        AppPlans::new(self.plans.iter().cloned())
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        options.apply_env();
        options
    }

    /// Apply `SOURCED_STATE_*` overrides. Unparseable values are logged and ignored.
    pub fn apply_env(&mut self) {
        if let Some(limit) = read_env_usize(ENV_MAX_CONCURRENT_LOADS) {
            self.provider.max_concurrent_loads = (limit > 0).then_some(limit);
        }
        if let Some(every) = read_env_usize(ENV_SCAN_YIELD_EVERY) {
            self.snapshots.scan_yield_every = every.max(1);
        }
    }
}

fn read_env_usize(key: &str) -> Option<usize> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, value = %raw, error = %err, "ignoring invalid environment override");
            None
        }
    }
}
