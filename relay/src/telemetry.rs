//! Tracing initialization for hosting binaries and tests.

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber with env-filter support.
///
/// Defaults to `info` when `RUST_LOG` is unset. Safe to call more than
/// once; later calls are ignored.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
