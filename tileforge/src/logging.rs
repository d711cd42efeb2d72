//! Logging infrastructure for TileForge.
//!
//! Structured console logging via `tracing-subscriber`, configurable with
//! the `RUST_LOG` environment variable and defaulting to `info`. Hosts that
//! install their own subscriber can skip this entirely; the library only
//! emits `tracing` events.

use tracing_subscriber::EnvFilter;

/// Initialize console logging.
///
/// Safe to call more than once; subsequent calls are no-ops because a global
/// subscriber may already be installed (common in test binaries).
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
