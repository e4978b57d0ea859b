//! Connection readiness and the observable state snapshot.
//!
//! [`Readiness`] mirrors the four WebSocket `readyState` values plus an
//! [`Readiness::Unconnected`] sentinel for the time before the first
//! `connect`. [`ConnectionState`] is what callers observe; it is refreshed
//! from the live connection after every lifecycle event.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

// ============================================================================
// Readiness
// ============================================================================

/// Lifecycle of the underlying connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Readiness {
    /// No connection has been created yet.
    #[default]
    Unconnected,
    /// Opening handshake in progress.
    Connecting,
    /// Open and ready to communicate.
    Open,
    /// Close handshake in progress.
    Closing,
    /// Closed or failed to open.
    Closed,
}

impl Readiness {
    /// Returns the WebSocket `readyState` code, or `None` for
    /// [`Readiness::Unconnected`].
    #[inline]
    #[must_use]
    pub const fn ready_state(self) -> Option<u16> {
        match self {
            Self::Unconnected => None,
            Self::Connecting => Some(0),
            Self::Open => Some(1),
            Self::Closing => Some(2),
            Self::Closed => Some(3),
        }
    }

    /// Returns `true` if frames can be written.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` once the connection can no longer deliver events.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Uppercase name used in logs and error messages.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconnected => "UNCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
            Self::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ConnectionState
// ============================================================================

/// Snapshot of the transport's connection state.
///
/// Obtained from [`Transport::state`](crate::Transport::state) or observed
/// through [`Transport::watch_state`](crate::Transport::watch_state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConnectionState {
    /// Readiness of the current connection.
    pub readiness: Readiness,
}

impl ConnectionState {
    /// Creates a state snapshot.
    #[inline]
    #[must_use]
    pub const fn new(readiness: Readiness) -> Self {
        Self { readiness }
    }
}

// ============================================================================
// Tests
// ============================================================================
