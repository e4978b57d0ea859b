//! WebSocket transport layer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                       ┌─────────────────┐
//! │  Transport           │                       │  Chat server    │
//! │   state (watch)      │       WebSocket       │                 │
//! │   sink ◄── events    │◄─────────────────────►│  line-oriented  │
//! │   Socket ─► loop     │   "...\r\n" frames    │  protocol       │
//! └──────────────────────┘                       └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Transport::connect` - Create a `Socket`, spawn its event loop
//! 2. Handshake - `Connecting` → `Open`, sink gets `Connected`
//! 3. `write` / inbound frames - `Sent` / `Received`
//! 4. `Transport::close` - `Closing`, close frame with code 1000
//! 5. Stream end - `Closed`, sink gets `Closed`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Transport builder |
//! | `connection` | Socket handle and event loop |
//! | `core` | The `Transport` type |
//! | `listener` | Listener registry and context |

// ============================================================================
// Submodules
// ============================================================================

/// Transport builder.
pub mod builder;

/// Socket handle and per-connection event loop.
pub mod connection;

/// The transport type.
pub mod core;

/// Listener registry and the context handed to listeners.
pub mod listener;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::TransportBuilder;
pub use connection::{CLOSE_CODE, CLOSE_REASON, Socket};
pub use self::core::Transport;
pub use listener::{Listener, ListenerContext};
