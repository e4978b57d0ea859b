//! Error types for the chat transport.
//!
//! The lenient transport operations ([`Transport::write`], [`Transport::close`],
//! [`Transport::on`]) never surface errors. Their strict twins and the
//! configuration layer return [`Result<T>`] which uses [`Error`].
//!
//! # Usage
//!
//! ```ignore
//! use chat_transport::{Error, Result, Transport};
//!
//! fn send_nick(transport: &Transport) -> Result<()> {
//!     transport.try_write("NICK guest")?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Misuse | [`Error::NotConnected`], [`Error::NotOpen`] |
//! | Connection | [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::NoRuntime`] |
//! | Decoding | [`Error::InvalidUtf8`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |
//!
//! [`Transport::write`]: crate::Transport::write
//! [`Transport::close`]: crate::Transport::close
//! [`Transport::on`]: crate::Transport::on

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;
use std::string::FromUtf8Error;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::state::Readiness;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a [`TransportConfig`](crate::TransportConfig) fails validation.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Misuse Errors
    // ========================================================================
    /// No connection handle exists.
    ///
    /// Returned by the strict operations before `connect` or after `close`.
    #[error("Not connected")]
    NotConnected,

    /// A handle exists but is not open for writing.
    #[error("Connection is not open (readiness: {readiness})")]
    NotOpen {
        /// Readiness of the handle at the time of the call.
        readiness: Readiness,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Opening handshake did not finish in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The connection's event loop is gone.
    #[error("Connection closed")]
    ConnectionClosed,

    /// `connect` was called outside a tokio runtime.
    #[error("No tokio runtime available to drive the connection")]
    NoRuntime,

    // ========================================================================
    // Decoding Errors
    // ========================================================================
    /// Inbound binary payload was not valid UTF-8.
    #[error("Invalid UTF-8 payload: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a not-open error.
    #[inline]
    pub fn not_open(readiness: Readiness) -> Self {
        Self::NotOpen { readiness }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectionTimeout { .. })
    }

    /// Returns `true` if the caller used the transport without a usable handle.
    #[inline]
    #[must_use]
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::NotConnected | Self::NotOpen { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::NoRuntime
                | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
