//! Builder pattern for transport configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use chat_transport::{Transport, TransportConfig};
//!
//! # fn example() -> chat_transport::Result<()> {
//! let (transport, mut events) = Transport::builder()
//!     .config(TransportConfig::new().with_close_timeout(Duration::from_secs(1)))
//!     .build_channel()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::trace;

use crate::config::TransportConfig;
use crate::error::Result;
use crate::protocol::{EventSink, OutputEvent};

use super::core::Transport;

// ============================================================================
// TransportBuilder
// ============================================================================

/// Builder for a [`Transport`].
///
/// Use [`Transport::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct TransportBuilder {
    /// Transport settings.
    config: TransportConfig,
    /// Notification sink.
    sink: Option<EventSink>,
}

impl fmt::Debug for TransportBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportBuilder")
            .field("config", &self.config)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

// ============================================================================
// TransportBuilder Implementation
// ============================================================================

impl TransportBuilder {
    /// Creates a builder with default configuration and no sink.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transport configuration.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the callback receiving every [`OutputEvent`].
    #[inline]
    #[must_use]
    pub fn sink(mut self, sink: impl Fn(OutputEvent) + Send + Sync + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Builds the transport.
    ///
    /// Without a sink, notifications are only traced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration
    /// is invalid.
    pub fn build(self) -> Result<Transport> {
        self.config.validate()?;

        let sink = self.sink.unwrap_or_else(|| {
            Arc::new(|event: OutputEvent| trace!(?event, "No sink installed, event dropped"))
        });

        Ok(Transport::with_parts(self.config, sink))
    }

    /// Builds the transport with a channel as its sink.
    ///
    /// Replaces any sink set with [`sink`](Self::sink).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration
    /// is invalid.
    pub fn build_channel(self) -> Result<(Transport, mpsc::UnboundedReceiver<OutputEvent>)> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let transport = self
            .sink(move |event| {
                let _ = event_tx.send(event);
            })
            .build()?;
        Ok((transport, event_rx))
    }
}

// ============================================================================
// Tests
// ============================================================================
