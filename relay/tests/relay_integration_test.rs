//! Mocked end-to-end relay test — a deterministic producer loop feeding
//! the bus while viewer sessions connect, catch up, and disconnect, with
//! operator pause/cancel arriving through the signal store.
//!
//! Covers: guard ↔ signal store ↔ bus ↔ stream session ↔ tracker ↔ metrics
//! running together, no network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use debate_relay::budget::BudgetConfig;
use debate_relay::debate::DebateId;
use debate_relay::events::{DebateEvent, DebateEventBus, Participant};
use debate_relay::guard::{DebateGuard, GateOutcome, StopCause};
use debate_relay::metrics::MetricsSnapshot;
use debate_relay::signal::{AbortReason, AbortSignalStore};
use debate_relay::stream::{ConnectionTracker, EventSink, SessionState, SinkError, StreamSession};

/// Sink that records frames; optionally fails every write.
struct MockSink {
    frames: Arc<Mutex<Vec<String>>>,
    broken: bool,
}

impl MockSink {
    fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                frames: frames.clone(),
                broken: false,
            },
            frames,
        )
    }

    fn broken() -> Self {
        Self {
            frames: Arc::new(Mutex::new(Vec::new())),
            broken: true,
        }
    }
}

#[async_trait]
impl EventSink for MockSink {
    async fn send_frame(&mut self, frame: &str) -> Result<(), SinkError> {
        if self.broken {
            return Err(SinkError::Closed);
        }
        self.frames.lock().unwrap().push(frame.to_string());
        Ok(())
    }
}

fn turn_complete(debate: &DebateId, turn: u32, tokens: u32) -> DebateEvent {
    DebateEvent::TurnComplete {
        debate_id: debate.clone(),
        turn_number: turn,
        participant: if turn % 2 == 0 {
            Participant::Con
        } else {
            Participant::Pro
        },
        tokens_used: tokens,
        timestamp: Utc::now(),
    }
}

fn tight_budget() -> BudgetConfig {
    BudgetConfig {
        max_tokens_per_debate: 5_000,
        max_tokens_per_turn: 1_000,
        warning_threshold_percent: 60,
        hard_limit_enabled: true,
        cost_limit_usd: None,
    }
}

// ── Viewer catch-up and live follow ────────────────────────────────

#[tokio::test]
async fn test_viewer_catches_up_then_follows_live() {
    let bus = DebateEventBus::new().shared();
    let tracker = ConnectionTracker::new().shared();
    let debate = DebateId::parse("live-1").unwrap();

    // Producer ran before any viewer connected
    bus.publish(&debate, turn_complete(&debate, 1, 800)).unwrap();
    bus.publish(&debate, turn_complete(&debate, 2, 900)).unwrap();

    let (sink, frames) = MockSink::new();
    let (session, handle) = StreamSession::new(debate.clone(), bus.clone(), tracker.clone(), sink);
    let task = tokio::spawn(session.run());
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Live turn after the viewer connected
    bus.publish(&debate, turn_complete(&debate, 3, 700)).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    handle.cancel();
    assert_eq!(task.await.unwrap(), SessionState::Cancelled);

    let frames = frames.lock().unwrap();
    let turns: Vec<u32> = frames
        .iter()
        .filter(|f| f.contains("turn_complete"))
        .map(|f| {
            let json = f.trim_end().strip_prefix("data: ").unwrap();
            match serde_json::from_str::<DebateEvent>(json).unwrap() {
                DebateEvent::TurnComplete { turn_number, .. } => turn_number,
                _ => unreachable!(),
            }
        })
        .collect();

    // Buffered history first, in order, then the live event
    assert_eq!(turns, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_reconnect_sees_only_replay_window() {
    let bus = DebateEventBus::with_capacity(2).shared();
    let tracker = ConnectionTracker::new().shared();
    let debate = DebateId::parse("window-1").unwrap();

    for turn in 1..=3 {
        bus.publish(&debate, turn_complete(&debate, turn, 500))
            .unwrap();
    }

    let (sink, frames) = MockSink::new();
    let (session, handle) = StreamSession::new(debate, bus, tracker, sink);
    let task = tokio::spawn(session.run());
    tokio::time::sleep(Duration::from_millis(30)).await;
    handle.cancel();
    task.await.unwrap();

    let frames = frames.lock().unwrap();
    let replayed: Vec<&String> = frames.iter().filter(|f| f.contains("turn_complete")).collect();
    assert_eq!(replayed.len(), 2);
    assert!(replayed[0].contains("\"turn_number\":2"));
    assert!(replayed[1].contains("\"turn_number\":3"));
}

// ── Broken viewer never blocks the producer or other viewers ───────

#[tokio::test]
async fn test_broken_viewer_is_isolated() {
    let bus = DebateEventBus::new().shared();
    let tracker = ConnectionTracker::new().shared();
    let debate = DebateId::parse("iso-1").unwrap();

    // A healthy viewer and one whose transport is already gone
    let (good_sink, good_frames) = MockSink::new();
    let (good_session, good_handle) =
        StreamSession::new(debate.clone(), bus.clone(), tracker.clone(), good_sink);
    let (bad_session, _bad_handle) = StreamSession::new(
        debate.clone(),
        bus.clone(),
        tracker.clone(),
        MockSink::broken(),
    );

    let good_task = tokio::spawn(good_session.run());
    let bad_task = tokio::spawn(bad_session.run());
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The broken session closed itself on its first write
    assert_eq!(bad_task.await.unwrap(), SessionState::Closed);

    // Publishing still succeeds and reaches the healthy viewer
    bus.publish(&debate, turn_complete(&debate, 1, 400)).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    good_handle.cancel();
    good_task.await.unwrap();

    assert!(good_frames
        .lock()
        .unwrap()
        .iter()
        .any(|f| f.contains("turn_complete")));
    assert_eq!(tracker.active(), 0);
    assert_eq!(tracker.total_opened(), 2);
}

// ── Operator pause/resume/cancel through the shared store ──────────

#[tokio::test]
async fn test_producer_loop_honors_pause_and_cancel() {
    let signals = AbortSignalStore::in_memory().shared();
    let bus = DebateEventBus::new().shared();
    let guard = DebateGuard::new(signals.clone(), tight_budget());
    let debate = DebateId::parse("gated-1").unwrap();

    let mut tokens_used = 0u64;
    let mut turn = 0u32;

    // Produce while the gate allows it
    while let GateOutcome::Continue = guard.evaluate(&debate, tokens_used) {
        turn += 1;
        bus.publish(&debate, turn_complete(&debate, turn, 1_000))
            .unwrap();
        tokens_used += 1_000;
    }

    // 60% warning threshold of a 5000-token budget: three turns produced
    assert_eq!(turn, 3);
    assert_eq!(
        guard.evaluate(&debate, tokens_used),
        GateOutcome::Warn { percent_used: 60 }
    );

    // Operator pauses from "another process" (same store, different caller)
    signals.set_signal(&debate, AbortReason::Paused).unwrap();
    assert_eq!(guard.evaluate(&debate, tokens_used), GateOutcome::Hold);

    // Resume clears the flag; the warning state is visible again
    signals.clear_signal(&debate).unwrap();
    assert!(matches!(
        guard.evaluate(&debate, tokens_used),
        GateOutcome::Warn { .. }
    ));

    // Cancel wins over everything, including an exhausted budget
    signals.set_signal(&debate, AbortReason::Cancelled).unwrap();
    let outcome = guard.evaluate(&debate, 50_000);
    assert_eq!(outcome, GateOutcome::Stop(StopCause::Cancelled));
    assert!(outcome.should_stop());
}

#[tokio::test]
async fn test_budget_exhaustion_stops_production() {
    let signals = AbortSignalStore::in_memory().shared();
    let guard = DebateGuard::new(signals, tight_budget());
    let debate = DebateId::parse("gated-2").unwrap();

    let outcome = guard.evaluate(&debate, 5_000);
    assert_eq!(
        outcome,
        GateOutcome::Stop(StopCause::BudgetExhausted {
            used: 5_000,
            limit: 5_000
        })
    );
}

// ── Metrics reflect session lifecycle ──────────────────────────────

#[tokio::test]
async fn test_metrics_track_sessions_and_publishes() {
    let bus = DebateEventBus::new().shared();
    let tracker = ConnectionTracker::new().shared();
    let debate = DebateId::parse("metrics-1").unwrap();

    let (sink_a, _frames_a) = MockSink::new();
    let (session_a, handle_a) =
        StreamSession::new(debate.clone(), bus.clone(), tracker.clone(), sink_a);
    let (sink_b, _frames_b) = MockSink::new();
    let (session_b, handle_b) =
        StreamSession::new(debate.clone(), bus.clone(), tracker.clone(), sink_b);

    let task_a = tokio::spawn(session_a.run());
    let task_b = tokio::spawn(session_b.run());
    tokio::time::sleep(Duration::from_millis(50)).await;

    bus.publish(&debate, turn_complete(&debate, 1, 100)).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let mid = MetricsSnapshot::gather(&tracker, &bus);
    assert_eq!(mid.active_connections, 2);
    assert_eq!(mid.events_published_total, 1);

    handle_a.cancel();
    task_a.await.unwrap();

    let after_one = MetricsSnapshot::gather(&tracker, &bus);
    assert_eq!(after_one.active_connections, 1);
    assert_eq!(after_one.connections_opened_total, 2);

    handle_b.cancel();
    task_b.await.unwrap();
    assert_eq!(tracker.active(), 0);

    let text = MetricsSnapshot::gather(&tracker, &bus).render_prometheus();
    assert!(text.contains("relay_active_connections 0"));
    assert!(text.contains("relay_connections_opened_total 2"));
}
