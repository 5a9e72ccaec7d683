//! Abort signal store — pause/cancel flags shared across execution contexts
//!
//! The debate-production loop and the operator issuing a pause/cancel may
//! run in unrelated processes, so these flags live in a durable keyed store
//! with a TTL. An in-memory map is retained strictly as a same-process
//! fallback for local development; the backend is fixed for the process
//! lifetime and never mixed per debate.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::debate::DebateId;

/// How long a pause/cancel flag stays live before it is logically absent.
///
/// TTL bounds the damage of a stale flag; callers still clear explicitly on
/// resume/restart rather than relying on expiry.
pub const SIGNAL_TTL_SECS: i64 = 3600;

/// Error type for signal store operations
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Store write failed: {0}")]
    WriteFailed(String),

    #[error("Store open failed: {0}")]
    OpenFailed(String),
}

/// Result type for signal store operations
pub type SignalResult<T> = Result<T, SignalError>;

/// Why a debate was aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// Operator requested a pause; the debate may be resumed.
    Paused,
    /// Operator cancelled the debate outright.
    Cancelled,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::Paused => write!(f, "paused"),
            AbortReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// The value the production loop reads before each turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortSignal {
    pub aborted: bool,
    pub reason: Option<AbortReason>,
}

impl AbortSignal {
    /// The "not aborted" value returned for absent, expired, or unreadable
    /// signals.
    pub fn clear() -> Self {
        Self {
            aborted: false,
            reason: None,
        }
    }
}

/// On-store representation, JSON-encoded for debuggability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredSignal {
    pub aborted: bool,
    pub reason: Option<AbortReason>,
    pub expires_at: DateTime<Utc>,
}

/// Backend selected once at construction.
enum Backend {
    Memory(RwLock<HashMap<String, StoredSignal>>),
    #[cfg(feature = "durable-signals")]
    Durable(super::durable::SignalDb),
}

/// Shared reference to AbortSignalStore
pub type SharedAbortSignalStore = std::sync::Arc<AbortSignalStore>;

/// Cross-process pause/cancel flag store.
///
/// Writers unconditionally overwrite; readers treat "not found, expired, or
/// malformed" uniformly as not aborted. Fail open is the contract: a false
/// negative costs one extra turn, a false positive wedges a debate.
pub struct AbortSignalStore {
    backend: Backend,
    ttl: Duration,
}

impl AbortSignalStore {
    /// Create an in-memory store (same-process fallback / local development).
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(SIGNAL_TTL_SECS),
        }
    }

    /// Open a durable store at the given path.
    #[cfg(feature = "durable-signals")]
    pub fn durable(path: impl Into<std::path::PathBuf>) -> SignalResult<Self> {
        Ok(Self {
            backend: Backend::Durable(super::durable::SignalDb::open(path)?),
            ttl: Duration::seconds(SIGNAL_TTL_SECS),
        })
    }

    /// Override the TTL (tests).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Create a shared reference to this store
    pub fn shared(self) -> SharedAbortSignalStore {
        std::sync::Arc::new(self)
    }

    /// Write `{aborted: true, reason}` with a fresh TTL, overwriting any
    /// prior value. Idempotent from the caller's view.
    pub fn set_signal(&self, debate_id: &DebateId, reason: AbortReason) -> SignalResult<()> {
        let stored = StoredSignal {
            aborted: true,
            reason: Some(reason),
            expires_at: Utc::now() + self.ttl,
        };

        match &self.backend {
            Backend::Memory(map) => {
                let mut map = map
                    .write()
                    .map_err(|_| SignalError::WriteFailed("lock poisoned".to_string()))?;
                map.insert(debate_id.as_str().to_string(), stored);
            }
            #[cfg(feature = "durable-signals")]
            Backend::Durable(db) => db.put(debate_id.as_str(), &stored)?,
        }

        info!(debate_id = %debate_id, reason = %reason, "Abort signal set");
        Ok(())
    }

    /// Remove the flag — used when a debate is (re)started or resumed.
    pub fn clear_signal(&self, debate_id: &DebateId) -> SignalResult<()> {
        match &self.backend {
            Backend::Memory(map) => {
                let mut map = map
                    .write()
                    .map_err(|_| SignalError::WriteFailed("lock poisoned".to_string()))?;
                map.remove(debate_id.as_str());
            }
            #[cfg(feature = "durable-signals")]
            Backend::Durable(db) => db.delete(debate_id.as_str())?,
        }

        info!(debate_id = %debate_id, "Abort signal cleared");
        Ok(())
    }

    /// Current signal value; absent, expired, or unreadable stored state all
    /// yield [`AbortSignal::clear`].
    pub fn check_signal(&self, debate_id: &DebateId) -> AbortSignal {
        self.check_signal_at(debate_id, Utc::now())
    }

    /// Expiry is evaluated against an explicit `now` so tests can simulate
    /// clock advance.
    pub fn check_signal_at(&self, debate_id: &DebateId, now: DateTime<Utc>) -> AbortSignal {
        let stored = match &self.backend {
            Backend::Memory(map) => match map.read() {
                Ok(map) => map.get(debate_id.as_str()).cloned(),
                Err(_) => {
                    warn!(debate_id = %debate_id, "Signal map lock poisoned; treating as not aborted");
                    None
                }
            },
            #[cfg(feature = "durable-signals")]
            Backend::Durable(db) => db.get(debate_id.as_str()),
        };

        match stored {
            Some(sig) if sig.expires_at > now => AbortSignal {
                aborted: sig.aborted,
                reason: sig.reason,
            },
            _ => AbortSignal::clear(),
        }
    }

    /// Whether the debate is currently paused
    pub fn is_paused(&self, debate_id: &DebateId) -> bool {
        let signal = self.check_signal(debate_id);
        signal.aborted && signal.reason == Some(AbortReason::Paused)
    }

    /// Whether the debate is currently cancelled
    pub fn is_cancelled(&self, debate_id: &DebateId) -> bool {
        let signal = self.check_signal(debate_id);
        signal.aborted && signal.reason == Some(AbortReason::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_id(raw: &str) -> DebateId {
        DebateId::parse(raw).unwrap()
    }

    #[test]
    fn test_set_then_check_paused() {
        let store = AbortSignalStore::in_memory();
        let debate = test_id("d-1");

        store.set_signal(&debate, AbortReason::Paused).unwrap();

        let signal = store.check_signal(&debate);
        assert!(signal.aborted);
        assert_eq!(signal.reason, Some(AbortReason::Paused));
        assert!(store.is_paused(&debate));
        assert!(!store.is_cancelled(&debate));
    }

    #[test]
    fn test_clear_returns_not_aborted() {
        let store = AbortSignalStore::in_memory();
        let debate = test_id("d-2");

        store.set_signal(&debate, AbortReason::Cancelled).unwrap();
        assert!(store.is_cancelled(&debate));

        store.clear_signal(&debate).unwrap();
        assert_eq!(store.check_signal(&debate), AbortSignal::clear());
    }

    #[test]
    fn test_absent_signal_is_not_aborted() {
        let store = AbortSignalStore::in_memory();
        let signal = store.check_signal(&test_id("never-set"));
        assert!(!signal.aborted);
        assert_eq!(signal.reason, None);
    }

    #[test]
    fn test_overwrite_replaces_reason() {
        let store = AbortSignalStore::in_memory();
        let debate = test_id("d-3");

        store.set_signal(&debate, AbortReason::Paused).unwrap();
        store.set_signal(&debate, AbortReason::Cancelled).unwrap();

        assert!(store.is_cancelled(&debate));
        assert!(!store.is_paused(&debate));
    }

    #[test]
    fn test_ttl_expiry_with_simulated_clock() {
        let store = AbortSignalStore::in_memory();
        let debate = test_id("d1");

        store.set_signal(&debate, AbortReason::Cancelled).unwrap();

        // Still live just before expiry
        let almost = Utc::now() + Duration::seconds(SIGNAL_TTL_SECS - 1);
        assert!(store.check_signal_at(&debate, almost).aborted);

        // Logically absent once the TTL elapses
        let after = Utc::now() + Duration::seconds(SIGNAL_TTL_SECS + 1);
        assert_eq!(store.check_signal_at(&debate, after), AbortSignal::clear());
    }

    #[test]
    fn test_set_is_idempotent() {
        let store = AbortSignalStore::in_memory();
        let debate = test_id("d-4");

        store.set_signal(&debate, AbortReason::Paused).unwrap();
        store.set_signal(&debate, AbortReason::Paused).unwrap();

        assert!(store.is_paused(&debate));
    }
}
