//! # Structured Logging Module
//!
//! Environment-aware `tracing` initialization for binaries and tests that
//! embed the dispatch engine. The library itself only emits spans and events;
//! hosts that already install their own subscriber can ignore this module.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize console logging with an environment-derived filter.
///
/// Respects `RUST_LOG` when set, defaulting to `info` otherwise. Safe to call
/// more than once; only the first call installs a subscriber, and an already
/// installed global subscriber is left in place.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true),
            )
            .try_init();
    });
}
