//! Server-sent event wire framing
//!
//! Each event is a `data:` line carrying the JSON-encoded event followed by
//! a blank line; keep-alive notices are comment lines starting with `:`.
//! Header constants are provided for the hosting transport layer.

use crate::events::DebateEvent;

/// Content type the transport must set for a persistent event stream.
pub const CONTENT_TYPE: &str = "text/event-stream";

/// Cache-control value disabling intermediary caching.
pub const CACHE_CONTROL: &str = "no-cache";

/// Header (name, value) disabling reverse-proxy buffering.
pub const NO_BUFFERING_HEADER: (&str, &str) = ("X-Accel-Buffering", "no");

/// Serialize an event as a `data:` frame.
pub fn data_frame(event: &DebateEvent) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(format!("data: {}\n\n", json))
}

/// Format a comment/keep-alive frame.
pub fn comment_frame(text: &str) -> String {
    format!(": {}\n\n", text)
}
