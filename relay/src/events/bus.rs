//! Per-debate event bus with a bounded replay buffer
//!
//! Provides pub/sub fan-out for one debate's live event stream plus a
//! capped recent-event buffer so (re)connecting viewers can catch up.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::{debug, warn};
use uuid::Uuid;

use super::types::DebateEvent;
use crate::debate::DebateId;

/// Replay window size per debate
pub const REPLAY_CAPACITY: usize = 50;

/// Error type for event bus operations
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Result type for event bus operations
pub type BusResult<T> = Result<T, BusError>;

/// Error a handler reports when it cannot accept a delivery
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Subscriber receiver dropped")]
    ReceiverGone,

    #[error("Delivery failed: {0}")]
    Failed(String),
}

/// Subscriber callback invoked once per published event.
///
/// Handlers run on the publisher's call stack and must not call back into
/// the bus.
pub type EventHandler = Box<dyn Fn(&DebateEvent) -> Result<(), DeliveryError> + Send + Sync>;

/// Opaque single-use subscription handle.
///
/// Passing it to [`DebateEventBus::unsubscribe`] removes the registration;
/// unsubscribing twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionToken {
    debate_id: DebateId,
    id: Uuid,
}

/// Per-debate channel state: registered handlers plus the replay buffer.
struct DebateChannel {
    subscribers: Vec<(Uuid, EventHandler)>,
    buffer: VecDeque<DebateEvent>,
}

impl DebateChannel {
    fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            buffer: VecDeque::with_capacity(REPLAY_CAPACITY),
        }
    }
}

/// Shared reference to DebateEventBus
pub type SharedDebateEventBus = std::sync::Arc<DebateEventBus>;

/// In-process pub/sub bus, keyed by debate id.
///
/// `publish` is safe to call concurrently with `subscribe`/`unsubscribe`
/// for the same debate; delivery order within one debate is publish order.
/// No ordering is guaranteed across debates.
pub struct DebateEventBus {
    channels: RwLock<HashMap<DebateId, DebateChannel>>,
    capacity: usize,
    published: AtomicU64,
}

impl DebateEventBus {
    /// Create a bus with the default replay capacity
    pub fn new() -> Self {
        Self::with_capacity(REPLAY_CAPACITY)
    }

    /// Create a bus with a custom replay capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity,
            published: AtomicU64::new(0),
        }
    }

    /// Create a shared reference to this bus
    pub fn shared(self) -> SharedDebateEventBus {
        std::sync::Arc::new(self)
    }

    /// Register a handler for every event subsequently published to `debate_id`.
    pub fn subscribe(
        &self,
        debate_id: &DebateId,
        handler: EventHandler,
    ) -> BusResult<SubscriptionToken> {
        let mut channels = self.channels.write().map_err(|_| BusError::LockPoisoned)?;
        let channel = channels
            .entry(debate_id.clone())
            .or_insert_with(DebateChannel::new);

        let id = Uuid::new_v4();
        channel.subscribers.push((id, handler));
        debug!(debate_id = %debate_id, subscribers = channel.subscribers.len(), "Subscriber registered");

        Ok(SubscriptionToken {
            debate_id: debate_id.clone(),
            id,
        })
    }

    /// Remove a subscription. Idempotent: unknown or already-removed tokens
    /// are ignored.
    pub fn unsubscribe(&self, token: &SubscriptionToken) -> BusResult<()> {
        let mut channels = self.channels.write().map_err(|_| BusError::LockPoisoned)?;
        if let Some(channel) = channels.get_mut(&token.debate_id) {
            let before = channel.subscribers.len();
            channel.subscribers.retain(|(id, _)| *id != token.id);
            if channel.subscribers.len() < before {
                debug!(debate_id = %token.debate_id, "Subscriber removed");
            }
        }
        Ok(())
    }

    /// Publish an event: append it to the replay buffer, then deliver it to
    /// every registered handler in registration order.
    ///
    /// Publishing with zero subscribers still updates the buffer so a late
    /// subscriber can catch up. A handler failure is logged and isolated;
    /// remaining handlers still receive the event.
    pub fn publish(&self, debate_id: &DebateId, event: DebateEvent) -> BusResult<()> {
        let event_type = event.event_type();
        let mut channels = self.channels.write().map_err(|_| BusError::LockPoisoned)?;
        let channel = channels
            .entry(debate_id.clone())
            .or_insert_with(DebateChannel::new);

        if channel.buffer.len() == self.capacity {
            channel.buffer.pop_front();
        }
        channel.buffer.push_back(event.clone());

        let mut delivered = 0usize;
        for (id, handler) in &channel.subscribers {
            match handler(&event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(debate_id = %debate_id, subscriber = %id, event_type, "Delivery failed: {}", e);
                }
            }
        }

        self.published.fetch_add(1, Ordering::Relaxed);
        debug!(debate_id = %debate_id, event_type, delivered, "Event published");
        Ok(())
    }

    /// Snapshot of the replay buffer for a debate, oldest first.
    pub fn recent_events(&self, debate_id: &DebateId) -> BusResult<Vec<DebateEvent>> {
        let channels = self.channels.read().map_err(|_| BusError::LockPoisoned)?;
        Ok(channels
            .get(debate_id)
            .map(|c| c.buffer.iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Lightweight existence check: does this debate have buffered events
    /// or live subscribers? Used by "anything worth connecting for" checks
    /// without transferring history.
    pub fn has_activity(&self, debate_id: &DebateId) -> BusResult<bool> {
        let channels = self.channels.read().map_err(|_| BusError::LockPoisoned)?;
        Ok(channels
            .get(debate_id)
            .map(|c| !c.buffer.is_empty() || !c.subscribers.is_empty())
            .unwrap_or(false))
    }

    /// Number of live subscribers for a debate
    pub fn subscriber_count(&self, debate_id: &DebateId) -> BusResult<usize> {
        let channels = self.channels.read().map_err(|_| BusError::LockPoisoned)?;
        Ok(channels
            .get(debate_id)
            .map(|c| c.subscribers.len())
            .unwrap_or(0))
    }

    /// Total events published across all debates since process start
    pub fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for DebateEventBus {
    fn default() -> Self {
        Self::new()
    }
}
