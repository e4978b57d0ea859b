//! Message-level types shared by the transport and its callers.
//!
//! # Wire Overview
//!
//! | Direction | Frame | Content |
//! |-----------|-------|---------|
//! | Local → Remote | Binary | UTF-8 text + `\r\n` |
//! | Remote → Local | Text or Binary | Delivered verbatim as text |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `decode` | Inbound payload decoding |
//! | `event` | Sink notifications and listener event kinds |
//! | `framing` | Outbound line framing |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound payload decoding.
pub mod decode;

/// Sink notifications and listener event kinds.
pub mod event;

/// Outbound line framing.
pub mod framing;

// ============================================================================
// Re-exports
// ============================================================================

pub use decode::{Blob, Decoded, InboundPayload, decode, decode_bytes};
pub use event::{EventKind, EventSink, OutputEvent};
pub use framing::{LINE_TERMINATOR, OutboundData, frame};
