//! Live debate event relay
//!
//! This library provides the real-time distribution and execution-control
//! layer for multi-turn, multi-agent debates:
//!
//! - **Event bus** (`events`): per-debate pub/sub with a bounded replay
//!   buffer so (re)connecting viewers catch up on recent history.
//! - **Abort signals** (`signal`): durable cross-process pause/cancel
//!   flags with a TTL, consulted by the debate-production loop. The
//!   producer and the operator issuing the request may run in unrelated
//!   processes; this store is the single source of truth.
//! - **Budgets** (`budget`): pure estimation and validation of the token
//!   budget a debate may consume.
//! - **Gate** (`guard`): combines signals and budgets into the one
//!   pre-turn "may production continue" answer.
//! - **Streaming** (`stream`): per-connection session lifecycle, SSE wire
//!   framing, and process-wide connection counters.
//! - **Metrics** (`metrics`): snapshot + exposition of process gauges,
//!   bearer-token gated.
//!
//! The debate/turn generation itself and the HTTP routing that exposes
//! these subsystems are external collaborators: generation publishes
//! [`events::DebateEvent`] values and polls [`guard::DebateGuard`]; the
//! hosting layer supplies a transport behind [`stream::EventSink`].
//!
//! # Usage
//!
//! ```ignore
//! use debate_relay::config::RelayConfig;
//! use debate_relay::debate::DebateId;
//! use debate_relay::events::DebateEventBus;
//! use debate_relay::signal::AbortReason;
//! use debate_relay::stream::{ConnectionTracker, StreamSession};
//!
//! let config = RelayConfig::from_env();
//! let signals = config.open_signal_store().shared();
//! let bus = DebateEventBus::new().shared();
//! let tracker = ConnectionTracker::new().shared();
//!
//! // Operator pauses a debate from any process sharing the store
//! let debate = DebateId::parse("debate-42")?;
//! signals.set_signal(&debate, AbortReason::Paused)?;
//!
//! // One viewer connection
//! let (session, handle) = StreamSession::new(debate, bus, tracker, sink);
//! tokio::spawn(session.run());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod budget;
pub mod config;
pub mod debate;
pub mod events;
pub mod guard;
pub mod metrics;
pub mod signal;
pub mod stream;
pub mod telemetry;

// Re-export key identifier types
pub use debate::{DebateId, IdError};

// Re-export key event types
pub use events::{
    BusError, BusResult, DebateEvent, DebateEventBus, DeliveryError, Participant,
    SharedDebateEventBus, SubscriptionToken,
};

// Re-export key signal types
pub use signal::{
    AbortReason, AbortSignal, AbortSignalStore, SharedAbortSignalStore, SignalError, SignalResult,
};

// Re-export key budget types
pub use budget::{calculate_budget_for_turns, resolve_config, validate, BudgetConfig};

// Re-export gate types
pub use guard::{DebateGuard, GateOutcome, StopCause};

// Re-export streaming types
pub use stream::{
    ConnectionTracker, EventSink, SessionHandle, SessionState, SharedConnectionTracker, SinkError,
    StreamSession,
};

// Re-export metrics types
pub use metrics::{MetricsAuth, MetricsSnapshot};

// Re-export configuration
pub use config::RelayConfig;
