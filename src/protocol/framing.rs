//! Outbound line framing.
//!
//! Every application message travels as one line: its text followed by
//! `\r\n`, encoded as UTF-8 and sent as a single binary WebSocket frame.
//! The peer splits its byte stream on the same terminator. Inbound frames
//! are never stripped.

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Cow;

// ============================================================================
// Constants
// ============================================================================

/// Terminator appended to every outbound message.
pub const LINE_TERMINATOR: &str = "\r\n";

// ============================================================================
// OutboundData
// ============================================================================

/// Payload accepted by [`Transport::write`](crate::Transport::write).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundData {
    /// UTF-8 text.
    Text(String),
    /// Raw bytes, framed by their lossy UTF-8 text.
    Binary(Vec<u8>),
}

impl OutboundData {
    /// Textual representation used for the `Sent` notification and the wire.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Binary(bytes) => String::from_utf8_lossy(bytes),
        }
    }
}

impl From<String> for OutboundData {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for OutboundData {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for OutboundData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<&[u8]> for OutboundData {
    fn from(bytes: &[u8]) -> Self {
        Self::Binary(bytes.to_vec())
    }
}

// ============================================================================
// Framing
// ============================================================================

/// Frames one message: `text` followed by CRLF, as UTF-8 bytes.
#[must_use]
pub fn frame(text: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(text.len() + LINE_TERMINATOR.len());
    buf.extend_from_slice(text.as_bytes());
    buf.extend_from_slice(LINE_TERMINATOR.as_bytes());
    buf
}

// ============================================================================
// Tests
// ============================================================================
