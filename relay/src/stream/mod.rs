//! Client-facing streaming: wire framing, session lifecycle, counters
//!
//! A `StreamSession` owns exactly one client connection: it replays the
//! debate's buffered history, relays live bus events, emits heartbeats,
//! and tears everything down exactly once regardless of which exit path
//! fires. The hosting HTTP layer supplies the transport behind the
//! [`EventSink`] seam.

pub mod session;
pub mod sse;
pub mod tracker;

// Re-export core types
pub use session::{
    EventSink, SessionHandle, SessionState, SinkError, StreamSession, HEARTBEAT_INTERVAL_MS,
};
pub use tracker::{ConnectionTracker, SharedConnectionTracker};
