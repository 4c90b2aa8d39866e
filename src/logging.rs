//! Process-wide `tracing` subscriber setup.
//!
//! The library only emits events; binaries and test harnesses call [`init`]
//! once to see them. The filter comes from `SOURCED_STATE_LOG` (same syntax as
//! `RUST_LOG`) and defaults to `info`.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "SOURCED_STATE_LOG";

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Install the fmt subscriber. Safe to call more than once; returns whether
/// this crate's subscriber is the active one.
pub fn init() -> bool {
    *INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            // Another subscriber may already be installed by the host.
            .try_init()
            .is_ok()
    })
}
