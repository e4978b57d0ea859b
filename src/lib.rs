//! Chat transport - line-framed WebSocket connection for chat clients.
//!
//! This library owns the real-time connection of a line-oriented chat
//! client (IRC over WebSocket and similar). It frames outbound messages as
//! CRLF-terminated lines, turns every inbound frame into text, tracks the
//! connection lifecycle, and reports everything through one sink callback.
//!
//! # Architecture
//!
//! - **Transport**: one value per session, cheap to clone, owns at most one
//!   connection at a time
//! - **Socket**: one per `connect`, driven by its own tokio task
//! - **Sink**: single callback receiving every [`OutputEvent`]
//! - **Listeners**: per-[`EventKind`] callbacks bound to the current socket
//!
//! # Quick Start
//!
//! ```no_run
//! use chat_transport::{EventKind, OutputEvent, Result, Transport};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let (transport, mut events) = Transport::builder().build_channel()?;
//!
//!     transport.connect("ws://127.0.0.1:6667/chat");
//!     transport.on(EventKind::Open, |ctx| ctx.write("NICK guest"));
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             OutputEvent::Received(line) => print!("{line}"),
//!             OutputEvent::Closed => break,
//!             other => println!("{other:?}"),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | [`TransportConfig`] and its enums |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Framing, decoding and event types |
//! | [`state`] | [`Readiness`] and [`ConnectionState`] |
//! | [`transport`] | [`Transport`], [`Socket`] and listeners |
//!
//! # Features
//!
//! - `rustls`: enables `wss://` addresses

// ============================================================================
// Modules
// ============================================================================

/// Transport configuration.
pub mod config;

/// Error types and result aliases.
///
/// Strict operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Framing, decoding and event types.
pub mod protocol;

/// Connection readiness and state snapshot.
pub mod state;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use config::{BinaryType, DecodePolicy, TransportConfig};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{EventKind, EventSink, LINE_TERMINATOR, OutboundData, OutputEvent};

// State types
pub use state::{ConnectionState, Readiness};

// Transport types
pub use transport::{Listener, ListenerContext, Socket, Transport, TransportBuilder};
