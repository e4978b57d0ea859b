//! Notification and event-kind types.
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | [`OutputEvent`] | Transport → sink | Every lifecycle and data occurrence |
//! | [`EventKind`] | Caller → transport | Selects which listener list `on` appends to |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

// ============================================================================
// OutputEvent
// ============================================================================

/// Notification passed to the sink.
///
/// # Format
///
/// ```json
/// { "kind": "Received", "payload": "PING :irc.example.org\r\n" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "payload")]
pub enum OutputEvent {
    /// Opening handshake completed.
    Connected,
    /// Connection closed.
    Closed,
    /// Connection or decoding failure. Details go to the log only.
    Errored,
    /// Message accepted by `write`, before framing.
    Sent(String),
    /// Inbound message, decoded to text.
    Received(String),
}

impl OutputEvent {
    /// Text payload of `Sent`/`Received`.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Sent(text) | Self::Received(text) => Some(text),
            _ => None,
        }
    }

    /// Returns `true` for `Connected`, `Closed` and `Errored`.
    #[inline]
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Connected | Self::Closed | Self::Errored)
    }
}

// ============================================================================
// EventSink
// ============================================================================

/// Callback receiving every [`OutputEvent`].
///
/// Invoked on the connection's event loop, or synchronously from `write`
/// and `connect`. Must not block.
pub type EventSink = Arc<dyn Fn(OutputEvent) + Send + Sync>;

// ============================================================================
// EventKind
// ============================================================================

/// Underlying connection events a listener can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Connection opened.
    Open,
    /// Connection closed.
    Close,
    /// Connection failed.
    Error,
    /// Message received.
    Message,
}

impl EventKind {
    /// All event kinds, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Open, Self::Message, Self::Error, Self::Close];

    /// Lowercase DOM-style event name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Error => "error",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_accessor() {
        assert_eq!(OutputEvent::Sent("HELLO".into()).payload(), Some("HELLO"));
        assert_eq!(OutputEvent::Received("PONG".into()).payload(), Some("PONG"));
        assert_eq!(OutputEvent::Connected.payload(), None);
    }

    #[test]
    fn test_is_lifecycle() {
        assert!(OutputEvent::Connected.is_lifecycle());
        assert!(OutputEvent::Errored.is_lifecycle());
        assert!(!OutputEvent::Sent(String::new()).is_lifecycle());
    }

    #[test]
    fn test_serialize_shape() {
        let json = serde_json::to_string(&OutputEvent::Received("hi\r\n".into())).unwrap();
        assert_eq!(json, r#"{"kind":"Received","payload":"hi\r\n"}"#);

        let json = serde_json::to_string(&OutputEvent::Closed).unwrap();
        assert_eq!(json, r#"{"kind":"Closed"}"#);
    }

    #[test]
    fn test_event_kind_names() {
        let names: Vec<_> = EventKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, ["open", "message", "error", "close"]);
    }
}
