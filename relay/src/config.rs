//! Process configuration
//!
//! Resolved once at startup from environment variables; every component
//! takes its dependencies explicitly, so the durable-vs-fallback signal
//! store choice is visible configuration rather than hidden global state.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::metrics::MetricsAuth;
use crate::signal::AbortSignalStore;

/// Startup configuration for the relay.
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    /// Path for the durable signal store. `None` selects the in-memory
    /// fallback (local development).
    pub signal_store_path: Option<PathBuf>,
    /// Bearer token guarding the metrics surface.
    pub metrics_token: Option<String>,
    /// Development mode: metrics open without a token.
    pub dev_mode: bool,
}

impl RelayConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        Self {
            signal_store_path: std::env::var("SIGNAL_STORE_PATH").ok().map(PathBuf::from),
            metrics_token: std::env::var("METRICS_BEARER_TOKEN").ok(),
            dev_mode: std::env::var("RELAY_DEV_MODE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Select the signal store backend. The choice is fixed for the process
    /// lifetime; an unreachable durable store falls back to in-memory with
    /// a warning rather than failing startup.
    pub fn open_signal_store(&self) -> AbortSignalStore {
        #[cfg(feature = "durable-signals")]
        if let Some(path) = &self.signal_store_path {
            match AbortSignalStore::durable(path) {
                Ok(store) => {
                    info!(path = %path.display(), "Durable signal store opened");
                    return store;
                }
                Err(e) => {
                    warn!(path = %path.display(), "Durable signal store unavailable, falling back to in-memory: {}", e);
                }
            }
        }

        #[cfg(not(feature = "durable-signals"))]
        if let Some(path) = &self.signal_store_path {
            warn!(path = %path.display(), "Built without durable-signals; using in-memory signal store");
        }

        info!("In-memory signal store selected");
        AbortSignalStore::in_memory()
    }

    /// Build the metrics gate from this config.
    pub fn metrics_auth(&self) -> MetricsAuth {
        MetricsAuth::new(self.metrics_token.clone(), self.dev_mode)
    }
}
