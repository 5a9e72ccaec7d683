//! RocksDB-backed signal storage
//!
//! Signals are stored as JSON for debuggability; anything unreadable is
//! treated as absent by the caller (fail open).

use std::path::PathBuf;
use std::sync::RwLock;

use rocksdb::{Options, DB};
use tracing::warn;

use super::store::{SignalError, SignalResult, StoredSignal};

/// Key prefix for abort signals
const SIGNAL_PREFIX: &str = "signal:";

/// Thin keyed-JSON wrapper over RocksDB.
pub(crate) struct SignalDb {
    db: RwLock<DB>,
}

impl SignalDb {
    pub(crate) fn open(path: impl Into<PathBuf>) -> SignalResult<Self> {
        let path = path.into();

        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, &path).map_err(|e| SignalError::OpenFailed(e.to_string()))?;

        Ok(Self {
            db: RwLock::new(db),
        })
    }

    pub(crate) fn put(&self, debate_id: &str, signal: &StoredSignal) -> SignalResult<()> {
        let bytes =
            serde_json::to_vec(signal).map_err(|e| SignalError::WriteFailed(e.to_string()))?;

        let db = self
            .db
            .read()
            .map_err(|_| SignalError::WriteFailed("lock poisoned".to_string()))?;
        db.put(Self::key(debate_id), bytes)
            .map_err(|e| SignalError::WriteFailed(e.to_string()))
    }

    pub(crate) fn delete(&self, debate_id: &str) -> SignalResult<()> {
        let db = self
            .db
            .read()
            .map_err(|_| SignalError::WriteFailed("lock poisoned".to_string()))?;
        db.delete(Self::key(debate_id))
            .map_err(|e| SignalError::WriteFailed(e.to_string()))
    }

    /// Read a stored signal. Read failures and malformed payloads both
    /// yield `None` — the caller's fail-open contract.
    pub(crate) fn get(&self, debate_id: &str) -> Option<StoredSignal> {
        let db = match self.db.read() {
            Ok(db) => db,
            Err(_) => {
                warn!(debate_id, "Signal db lock poisoned; treating as not aborted");
                return None;
            }
        };

        let bytes = match db.get(Self::key(debate_id)) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(debate_id, "Signal read failed; treating as not aborted: {}", e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(signal) => Some(signal),
            Err(e) => {
                warn!(debate_id, "Malformed stored signal; treating as not aborted: {}", e);
                None
            }
        }
    }

    fn key(debate_id: &str) -> String {
        format!("{}{}", SIGNAL_PREFIX, debate_id)
    }
}
