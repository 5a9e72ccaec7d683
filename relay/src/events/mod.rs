//! Event distribution for live debate viewing
//!
//! This module provides the pub/sub infrastructure that fans one debate's
//! turn events out to every connected viewer, plus the bounded replay
//! buffer that lets a (re)connecting viewer catch up.
//!
//! # Event Flow
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────┐     ┌──────────────┐
//! │   Producer   │────▶│ DebateEventBus  │────▶│  Subscribers │
//! │  (publish)   │     │ (per-debate)    │     │  (handlers)  │
//! └──────────────┘     └────────┬────────┘     └──────────────┘
//!                               │
//!                               ▼
//!                      ┌─────────────────┐
//!                      │  Replay buffer  │
//!                      │ (last N events) │
//!                      └─────────────────┘
//! ```
//!
//! Delivery is at-least-once per currently-registered handler; a handler
//! failure is isolated and never blocks the remaining handlers. The buffer
//! exists only for catch-up, never as the primary delivery path.

pub mod bus;
pub mod types;

// Re-export core types
pub use bus::{
    BusError, BusResult, DebateEventBus, DeliveryError, EventHandler, SharedDebateEventBus,
    SubscriptionToken, REPLAY_CAPACITY,
};
pub use types::{DebateEvent, Participant};
