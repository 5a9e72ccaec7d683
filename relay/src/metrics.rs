//! Pull-based metrics surface
//!
//! Gathers process gauges into a snapshot and renders them in a
//! line-oriented exposition format compatible with common scraping
//! collectors, plus a JSON variant. Access is gated by a bearer token when
//! one is configured, and open only in designated development mode
//! otherwise.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::events::SharedDebateEventBus;
use crate::stream::SharedConnectionTracker;

/// Point-in-time process gauges.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Currently open streaming connections.
    pub active_connections: usize,
    /// Connections opened since process start.
    pub connections_opened_total: u64,
    /// Events published across all debates since process start.
    pub events_published_total: u64,
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,
}

impl MetricsSnapshot {
    /// Gather current values from the tracker and the bus.
    pub fn gather(tracker: &SharedConnectionTracker, bus: &SharedDebateEventBus) -> Self {
        Self {
            active_connections: tracker.active(),
            connections_opened_total: tracker.total_opened(),
            events_published_total: bus.events_published(),
            timestamp: Utc::now(),
        }
    }

    /// Render in the line-oriented exposition format.
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();
        out.push_str("# TYPE relay_active_connections gauge\n");
        out.push_str(&format!(
            "relay_active_connections {}\n",
            self.active_connections
        ));
        out.push_str("# TYPE relay_connections_opened_total counter\n");
        out.push_str(&format!(
            "relay_connections_opened_total {}\n",
            self.connections_opened_total
        ));
        out.push_str("# TYPE relay_events_published_total counter\n");
        out.push_str(&format!(
            "relay_events_published_total {}\n",
            self.events_published_total
        ));
        out
    }

    /// Render as JSON.
    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Bearer-token gate for the metrics surface.
#[derive(Debug, Clone)]
pub struct MetricsAuth {
    token: Option<String>,
    dev_mode: bool,
}

impl MetricsAuth {
    pub fn new(token: Option<String>, dev_mode: bool) -> Self {
        Self { token, dev_mode }
    }

    /// Authorize a request given its `Authorization` header value.
    ///
    /// With a configured token, only an exact bearer match passes. Without
    /// one, the surface is open in development mode and closed otherwise.
    pub fn authorize(&self, authorization: Option<&str>) -> bool {
        match &self.token {
            Some(expected) => authorization
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(|presented| presented == expected)
                .unwrap_or(false),
            None => self.dev_mode,
        }
    }
}
