//! Event types for live debate streaming
//!
//! These events drive the pub/sub system and the replay buffer. Each event
//! is immutable once constructed; subscribers receive independent clones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::debate::DebateId;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Participant {
    /// Argues the proposition.
    Pro,
    /// Argues against the proposition.
    Con,
    /// Frames, summarizes, and adjudicates.
    Moderator,
}

impl std::fmt::Display for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Participant::Pro => write!(f, "pro"),
            Participant::Con => write!(f, "con"),
            Participant::Moderator => write!(f, "moderator"),
        }
    }
}

/// All live debate stream events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebateEvent {
    /// A participant began producing a turn
    TurnStarted {
        debate_id: DebateId,
        turn_number: u32,
        participant: Participant,
        timestamp: DateTime<Utc>,
    },

    /// An incremental chunk of turn content
    TurnDelta {
        debate_id: DebateId,
        turn_number: u32,
        delta: String,
        timestamp: DateTime<Utc>,
    },

    /// A turn finished producing
    TurnComplete {
        debate_id: DebateId,
        turn_number: u32,
        participant: Participant,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },

    /// The debate ran to completion
    DebateComplete {
        debate_id: DebateId,
        total_turns: u32,
        timestamp: DateTime<Utc>,
    },

    /// Synthetic keep-alive carrying the current server time
    Heartbeat {
        debate_id: DebateId,
        timestamp: DateTime<Utc>,
    },

    /// Production-side error surfaced to viewers
    Error {
        debate_id: DebateId,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl DebateEvent {
    /// Construct a heartbeat event stamped with the current server time.
    pub fn heartbeat(debate_id: DebateId) -> Self {
        DebateEvent::Heartbeat {
            debate_id,
            timestamp: Utc::now(),
        }
    }

    /// Get the debate this event belongs to
    pub fn debate_id(&self) -> &DebateId {
        match self {
            DebateEvent::TurnStarted { debate_id, .. } => debate_id,
            DebateEvent::TurnDelta { debate_id, .. } => debate_id,
            DebateEvent::TurnComplete { debate_id, .. } => debate_id,
            DebateEvent::DebateComplete { debate_id, .. } => debate_id,
            DebateEvent::Heartbeat { debate_id, .. } => debate_id,
            DebateEvent::Error { debate_id, .. } => debate_id,
        }
    }

    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DebateEvent::TurnStarted { timestamp, .. } => *timestamp,
            DebateEvent::TurnDelta { timestamp, .. } => *timestamp,
            DebateEvent::TurnComplete { timestamp, .. } => *timestamp,
            DebateEvent::DebateComplete { timestamp, .. } => *timestamp,
            DebateEvent::Heartbeat { timestamp, .. } => *timestamp,
            DebateEvent::Error { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            DebateEvent::TurnStarted { .. } => "turn_started",
            DebateEvent::TurnDelta { .. } => "turn_delta",
            DebateEvent::TurnComplete { .. } => "turn_complete",
            DebateEvent::DebateComplete { .. } => "debate_complete",
            DebateEvent::Heartbeat { .. } => "heartbeat",
            DebateEvent::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_id() -> DebateId {
        DebateId::parse("debate-1").unwrap()
    }

    #[test]
    fn test_event_serialization() {
        let event = DebateEvent::TurnStarted {
            debate_id: test_id(),
            turn_number: 1,
            participant: Participant::Pro,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"turn_started\""));
        assert!(json.contains("\"participant\":\"pro\""));

        let parsed: DebateEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event_type(), "turn_started");
    }

    #[test]
    fn test_event_accessors() {
        let event = DebateEvent::TurnComplete {
            debate_id: test_id(),
            turn_number: 3,
            participant: Participant::Moderator,
            tokens_used: 512,
            timestamp: Utc::now(),
        };

        assert_eq!(event.debate_id().as_str(), "debate-1");
        assert_eq!(event.event_type(), "turn_complete");
    }

    #[test]
    fn test_heartbeat_carries_server_time() {
        let before = Utc::now();
        let event = DebateEvent::heartbeat(test_id());
        let after = Utc::now();

        assert_eq!(event.event_type(), "heartbeat");
        assert!(event.timestamp() >= before && event.timestamp() <= after);
    }
}
