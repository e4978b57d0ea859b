//! Listener registry and the context handed to listeners.
//!
//! Listeners are kept per [`EventKind`], appended in registration order and
//! never deduplicated. They run after the transport's own handling of the
//! same event, so the state they observe is already refreshed.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::protocol::{EventKind, OutboundData};

use super::connection::Socket;
use super::core::Transport;

// ============================================================================
// Types
// ============================================================================

/// Listener callback registered through [`Transport::on`].
pub type Listener = Arc<dyn Fn(&ListenerContext) + Send + Sync>;

// ============================================================================
// ListenerRegistry
// ============================================================================

/// Listeners of one socket, keyed by event kind.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    by_kind: FxHashMap<EventKind, Vec<Listener>>,
}

impl ListenerRegistry {
    pub(crate) fn register(&mut self, kind: EventKind, listener: Listener) {
        self.by_kind.entry(kind).or_default().push(listener);
    }

    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<Listener> {
        self.by_kind.get(&kind).cloned().unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }
}

// ============================================================================
// ListenerContext
// ============================================================================

/// Bound handle passed to listeners.
///
/// Exposes `close`, `write` and a read-only view of the live socket. Writes
/// go through the transport, so framing applies.
pub struct ListenerContext {
    transport: Transport,
    socket: Socket,
    kind: EventKind,
}

impl ListenerContext {
    pub(crate) fn new(transport: Transport, socket: Socket, kind: EventKind) -> Self {
        Self {
            transport,
            socket,
            kind,
        }
    }

    /// Closes the transport's connection. See [`Transport::close`].
    #[inline]
    pub fn close(&self) {
        self.transport.close();
    }

    /// Writes one framed message. See [`Transport::write`].
    #[inline]
    pub fn write(&self, data: impl Into<OutboundData>) {
        self.transport.write(data);
    }

    /// The socket that produced the event.
    #[inline]
    #[must_use]
    pub fn socket(&self) -> &Socket {
        &self.socket
    }

    /// Kind of event being handled.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl fmt::Debug for ListenerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerContext")
            .field("socket", &self.socket)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
