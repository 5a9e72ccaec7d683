//! Stream session lifecycle — one live client connection
//!
//! `Created → Connected → {Closed | Cancelled}`; terminal states are
//! absorbing. On connect the session replays the debate's buffered history,
//! then relays live events and emits periodic heartbeats until the client
//! disconnects, the host cancels, or a transport write fails. Whichever
//! trigger fires first runs cleanup; an atomic guard keeps cleanup to at
//! most one execution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use super::sse;
use super::tracker::SharedConnectionTracker;
use crate::debate::DebateId;
use crate::events::{DebateEvent, DeliveryError, SharedDebateEventBus, SubscriptionToken};

/// Fixed heartbeat period
pub const HEARTBEAT_INTERVAL_MS: u64 = 30_000;

/// Error type for transport writes
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Connection closed")]
    Closed,

    #[error("Write failed: {0}")]
    Io(String),
}

/// Transport seam: whatever carries frames to the client.
#[async_trait]
pub trait EventSink: Send {
    async fn send_frame(&mut self, frame: &str) -> Result<(), SinkError>;

    /// Close the underlying connection. Called once during session
    /// teardown; errors from closing an already-closed transport are
    /// swallowed by the session. Transports that close on drop can keep
    /// the default no-op.
    async fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Lifecycle state of a stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Constructed but not yet serving.
    Created,
    /// Replaying history and relaying live events.
    Connected,
    /// Ended by client disconnect or transport failure.
    Closed,
    /// Ended by explicit host cancellation.
    Cancelled,
}

impl SessionState {
    /// Whether this is a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Connected => write!(f, "connected"),
            Self::Closed => write!(f, "closed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Host-side handle for cancelling a running session.
#[derive(Clone)]
pub struct SessionHandle {
    cancel: Arc<Notify>,
}

impl SessionHandle {
    /// Request cancellation. Idempotent — repeated calls have the same
    /// effect as one, and calling before the session starts is safe.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }
}

/// One client connection relaying a debate's event stream.
pub struct StreamSession<S: EventSink> {
    debate_id: DebateId,
    bus: SharedDebateEventBus,
    tracker: SharedConnectionTracker,
    sink: S,
    state: SessionState,
    cancel: Arc<Notify>,
    finalized: AtomicBool,
    token: Option<SubscriptionToken>,
    heartbeat_interval: Duration,
}

impl<S: EventSink> StreamSession<S> {
    /// Create a session and the handle the host uses to cancel it.
    pub fn new(
        debate_id: DebateId,
        bus: SharedDebateEventBus,
        tracker: SharedConnectionTracker,
        sink: S,
    ) -> (Self, SessionHandle) {
        let cancel = Arc::new(Notify::new());
        let session = Self {
            debate_id,
            bus,
            tracker,
            sink,
            state: SessionState::Created,
            cancel: cancel.clone(),
            finalized: AtomicBool::new(false),
            token: None,
            heartbeat_interval: Duration::from_millis(HEARTBEAT_INTERVAL_MS),
        };
        (session, SessionHandle { cancel })
    }

    /// Override the heartbeat period (tests).
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session to completion: connect, replay, relay live events,
    /// heartbeat, and clean up exactly once on whichever exit fires first.
    pub async fn run(mut self) -> SessionState {
        self.state = SessionState::Connected;
        self.tracker.increment();
        let started = Instant::now();
        info!(debate_id = %self.debate_id, "Stream session connected");

        let opening = sse::comment_frame(&format!("connected {}", self.debate_id));
        if self.sink.send_frame(&opening).await.is_err() {
            return self.finalize(SessionState::Closed, started).await;
        }

        // Catch-up: replay buffered history in order before going live
        let backlog = self.bus.recent_events(&self.debate_id).unwrap_or_default();
        debug!(debate_id = %self.debate_id, count = backlog.len(), "Replaying buffered events");
        for event in backlog {
            match sse::data_frame(&event) {
                Ok(frame) => {
                    if self.sink.send_frame(&frame).await.is_err() {
                        return self.finalize(SessionState::Closed, started).await;
                    }
                }
                Err(e) => warn!(debate_id = %self.debate_id, "Unserializable buffered event skipped: {}", e),
            }
        }

        // Live subscription: the bus handler forwards clones into this
        // session's channel.
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = match self.bus.subscribe(
            &self.debate_id,
            Box::new(move |event: &DebateEvent| {
                tx.send(event.clone()).map_err(|_| DeliveryError::ReceiverGone)
            }),
        ) {
            Ok(token) => token,
            Err(e) => {
                warn!(debate_id = %self.debate_id, "Subscribe failed: {}", e);
                return self.finalize(SessionState::Closed, started).await;
            }
        };
        self.token = Some(token);

        // Heartbeat timer lives and dies with the subscription
        let mut heartbeat = tokio::time::interval(self.heartbeat_interval);
        heartbeat.tick().await; // immediate first tick

        let end = loop {
            tokio::select! {
                maybe_event = rx.recv() => {
                    let Some(event) = maybe_event else {
                        break SessionState::Closed;
                    };
                    match sse::data_frame(&event) {
                        Ok(frame) => {
                            if self.sink.send_frame(&frame).await.is_err() {
                                break SessionState::Closed;
                            }
                        }
                        Err(e) => warn!(debate_id = %self.debate_id, "Unserializable event skipped: {}", e),
                    }
                }
                _ = heartbeat.tick() => {
                    if self.sink.send_frame(&sse::comment_frame("heartbeat")).await.is_err() {
                        break SessionState::Closed;
                    }
                    let beat = DebateEvent::heartbeat(self.debate_id.clone());
                    match sse::data_frame(&beat) {
                        Ok(frame) => {
                            if self.sink.send_frame(&frame).await.is_err() {
                                break SessionState::Closed;
                            }
                        }
                        Err(e) => warn!(debate_id = %self.debate_id, "Heartbeat serialization failed: {}", e),
                    }
                }
                _ = self.cancel.notified() => {
                    break SessionState::Cancelled;
                }
            }
        };

        self.finalize(end, started).await
    }

    /// Idempotent teardown: decrement the connection gauge, drop the bus
    /// subscription, close the transport, and record the session duration.
    /// Guarded so racing triggers run it at most once.
    async fn finalize(&mut self, end: SessionState, started: Instant) -> SessionState {
        if self.finalized.swap(true, Ordering::SeqCst) {
            return self.state;
        }

        if let Some(token) = self.token.take() {
            let _ = self.bus.unsubscribe(&token);
        }
        if let Err(e) = self.sink.close().await {
            debug!(debate_id = %self.debate_id, "Transport close error swallowed: {}", e);
        }
        self.tracker.decrement();
        self.state = end;

        info!(
            debate_id = %self.debate_id,
            state = %end,
            duration_ms = started.elapsed().as_millis() as u64,
            "Stream session ended"
        );
        end
    }
}
