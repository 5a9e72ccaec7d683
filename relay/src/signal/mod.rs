//! Durable pause/cancel signalling for debates
//!
//! The only channel through which an abort request issued in one execution
//! context becomes visible to a production loop running in another. No
//! locking across processes: writers unconditionally overwrite, readers
//! treat absent/expired/malformed uniformly as "not aborted".
//!
//! Backend selection is fixed at construction — durable (RocksDB, behind
//! the `durable-signals` feature) or in-memory fallback — and never mixed
//! per debate.

#[cfg(feature = "durable-signals")]
mod durable;
pub mod store;

// Re-export core types
pub use store::{
    AbortReason, AbortSignal, AbortSignalStore, SharedAbortSignalStore, SignalError, SignalResult,
    SIGNAL_TTL_SECS,
};
