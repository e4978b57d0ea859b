//! The transport: one connection, its state, and its listeners.
//!
//! # Example
//!
//! ```no_run
//! use chat_transport::{EventKind, Transport};
//!
//! # async fn example() {
//! let transport = Transport::new(|event| println!("{event:?}"));
//!
//! transport.connect("ws://127.0.0.1:6667/chat");
//! transport.on(EventKind::Open, |ctx| ctx.write("NICK guest"));
//!
//! // ...
//!
//! transport.close();
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, trace, warn};

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::protocol::{
    Decoded, EventKind, EventSink, OutboundData, OutputEvent, decode, frame,
};
use crate::state::{ConnectionState, Readiness};

use super::builder::TransportBuilder;
use super::connection::{Socket, SocketEvent};
use super::listener::ListenerContext;

// ============================================================================
// TransportInner
// ============================================================================

pub(crate) struct TransportInner {
    /// Settings applied to every connection.
    config: TransportConfig,
    /// Receives every notification.
    sink: EventSink,
    /// Current connection handle, if any.
    socket: Mutex<Option<Socket>>,
    /// Id of the most recent `connect`. Sockets with an older id are stale.
    generation: AtomicU64,
    /// Observable state.
    state: watch::Sender<ConnectionState>,
}

impl Drop for TransportInner {
    fn drop(&mut self) {
        if let Some(socket) = self.socket.get_mut().take() {
            debug!(id = socket.id(), "Transport dropped, closing connection");
            let _ = socket.request_close();
        }
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Owner of a single WebSocket connection.
///
/// Cheap to clone; clones share the same connection, state and sink.
///
/// # Thread Safety
///
/// `Transport` is `Send + Sync`. No operation blocks or awaits; all I/O
/// happens on the connection's event loop task.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("state", &self.state())
            .field("socket", &self.socket())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Transport - Constructors
// ============================================================================

impl Transport {
    /// Creates a transport with default configuration.
    pub fn new(sink: impl Fn(OutputEvent) + Send + Sync + 'static) -> Self {
        Self::with_parts(TransportConfig::default(), Arc::new(sink))
    }

    /// Creates a builder for custom configuration.
    #[inline]
    #[must_use]
    pub fn builder() -> TransportBuilder {
        TransportBuilder::new()
    }

    pub(crate) fn with_parts(config: TransportConfig, sink: EventSink) -> Self {
        let (state, _) = watch::channel(ConnectionState::default());
        Self {
            inner: Arc::new(TransportInner {
                config,
                sink,
                socket: Mutex::new(None),
                generation: AtomicU64::new(0),
                state,
            }),
        }
    }

    pub(crate) fn upgrade(weak: &Weak<TransportInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}

// ============================================================================
// Transport - Accessors
// ============================================================================

impl Transport {
    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }

    /// Returns the current state snapshot.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Subscribes to state changes.
    #[inline]
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Returns the current connection handle, if one is held.
    #[inline]
    #[must_use]
    pub fn socket(&self) -> Option<Socket> {
        self.inner.socket.lock().clone()
    }
}

// ============================================================================
// Transport - Operations
// ============================================================================

impl Transport {
    /// Opens a connection to `address`, replacing any current one.
    ///
    /// The address is not validated here; failures are reported as
    /// `Errored` followed by `Closed`. The previous connection, if any, is
    /// dropped without a close handshake and its events are no longer
    /// reported.
    pub fn connect(&self, address: impl Into<String>) {
        let address = address.into();

        let (socket, command_rx, previous) = {
            let mut current = self.inner.socket.lock();
            let id = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
            let (socket, command_rx) = Socket::new(id, address);
            let previous = current.replace(socket.clone());
            (socket, command_rx, previous)
        };

        if let Some(previous) = previous {
            debug!(previous = previous.id(), id = socket.id(), "Abandoning previous connection");
            previous.abandon();
        }

        debug!(id = socket.id(), address = %socket.address(), "Connecting");
        self.refresh_state(&socket);

        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(socket.run_event_loop(
                    command_rx,
                    Arc::downgrade(&self.inner),
                    self.inner.config.clone(),
                ));
            }
            Err(_) => {
                error!(id = socket.id(), error = %Error::NoRuntime, "Cannot start connection");
                socket.set_readiness(Readiness::Closed);
                self.dispatch(&socket, SocketEvent::Error);
                self.dispatch(&socket, SocketEvent::Close);
            }
        }
    }

    /// Closes the connection with code 1000 and reason `"client quit"`.
    ///
    /// Does nothing without a connection. The handle is released
    /// immediately; `Closed` is reported once the close handshake ends,
    /// even if `connect` has opened a new connection by then.
    pub fn close(&self) {
        if let Err(e) = self.try_close() {
            trace!(error = %e, "close ignored");
        }
    }

    /// Like [`close`](Self::close), but reports a missing connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if no handle is held.
    pub fn try_close(&self) -> Result<()> {
        let socket = {
            let mut current = self.inner.socket.lock();
            let socket = current.take().ok_or(Error::NotConnected)?;
            socket.mark_released();
            socket
        };

        if matches!(socket.readiness(), Readiness::Connecting | Readiness::Open) {
            socket.set_readiness(Readiness::Closing);
        }
        self.refresh_state(&socket);

        debug!(id = socket.id(), address = %socket.address(), "Closing connection");
        if let Err(e) = socket.request_close() {
            debug!(id = socket.id(), error = %e, "Close request not delivered");
        }
        Ok(())
    }

    /// Sends `data` as one CRLF-terminated line.
    ///
    /// Does nothing unless the connection is open. `Sent` is reported
    /// before the frame is handed to the event loop.
    pub fn write(&self, data: impl Into<OutboundData>) {
        if let Err(e) = self.try_write(data) {
            trace!(error = %e, "write ignored");
        }
    }

    /// Like [`write`](Self::write), but reports why nothing was sent.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if no handle is held
    /// - [`Error::NotOpen`] if the handle is not open
    /// - [`Error::ConnectionClosed`] if the event loop already exited
    pub fn try_write(&self, data: impl Into<OutboundData>) -> Result<()> {
        let socket = self.socket().ok_or(Error::NotConnected)?;

        let readiness = socket.readiness();
        if !readiness.is_open() {
            return Err(Error::not_open(readiness));
        }

        let data = data.into();
        let text = data.as_text();

        self.emit(OutputEvent::Sent(text.clone().into_owned()));
        self.refresh_state(&socket);

        let bytes = frame(&text);
        trace!(id = socket.id(), len = bytes.len(), "Frame queued");
        socket.send_frame(bytes)
    }

    /// Registers a listener on the current connection.
    ///
    /// Does nothing without a connection; listeners registered before
    /// `connect` are dropped. Listeners belong to the connection that was
    /// current at registration time.
    pub fn on(&self, kind: EventKind, listener: impl Fn(&ListenerContext) + Send + Sync + 'static) {
        if let Err(e) = self.try_on(kind, listener) {
            trace!(%kind, error = %e, "listener dropped");
        }
    }

    /// Like [`on`](Self::on), but reports a missing connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if no handle is held.
    pub fn try_on(
        &self,
        kind: EventKind,
        listener: impl Fn(&ListenerContext) + Send + Sync + 'static,
    ) -> Result<()> {
        let socket = self.socket().ok_or(Error::NotConnected)?;
        socket.register(kind, Arc::new(listener));
        trace!(id = socket.id(), %kind, "Listener registered");
        Ok(())
    }
}

// ============================================================================
// Transport - Dispatch
// ============================================================================

impl Transport {
    /// Runs the fixed handler for `event`, then the socket's listeners.
    pub(crate) fn dispatch(&self, socket: &Socket, event: SocketEvent) {
        let kind = event.kind();

        if !self.is_current(socket) && !Self::reports_after_release(socket, kind) {
            trace!(id = socket.id(), %kind, "Discarding event from superseded connection");
            return;
        }

        self.refresh_state(socket);

        match event {
            SocketEvent::Open => self.emit(OutputEvent::Connected),
            SocketEvent::Close => self.emit(OutputEvent::Closed),
            SocketEvent::Error => self.emit(OutputEvent::Errored),
            SocketEvent::Message(payload) => {
                match decode(payload, self.inner.config.decode_policy) {
                    Decoded::Ready(result) => self.deliver(socket, result),
                    Decoded::Pending(pending) => {
                        let transport = Arc::downgrade(&self.inner);
                        let socket = socket.clone();
                        tokio::spawn(async move {
                            let result = pending.await;
                            if let Some(transport) = Self::upgrade(&transport)
                                && transport.is_current(&socket)
                            {
                                transport.deliver(&socket, result);
                                transport.refresh_state(&socket);
                            }
                        });
                    }
                }
            }
        }

        let listeners = socket.listeners(kind);
        if listeners.is_empty() {
            return;
        }

        let ctx = ListenerContext::new(self.clone(), socket.clone(), kind);
        for listener in listeners {
            listener(&ctx);
            self.refresh_state(socket);
        }
    }

    /// Publishes `socket`'s readiness unless a newer connection replaced it.
    ///
    /// The generation is checked while the state is locked, so a concurrent
    /// `connect` cannot be overwritten by the connection it replaced.
    pub(crate) fn refresh_state(&self, socket: &Socket) {
        self.inner.state.send_if_modified(|state| {
            if !self.is_current(socket) {
                return false;
            }
            let readiness = socket.readiness();
            if state.readiness == readiness {
                return false;
            }
            state.readiness = readiness;
            true
        });
    }

    /// Whether a socket released by `close` still reports `kind` after a
    /// newer `connect`. Only its closing events get through, and they never
    /// touch the published state.
    fn reports_after_release(socket: &Socket, kind: EventKind) -> bool {
        socket.is_released() && matches!(kind, EventKind::Error | EventKind::Close)
    }

    fn deliver(&self, socket: &Socket, result: Result<String>) {
        match result {
            Ok(text) => {
                trace!(id = socket.id(), len = text.len(), "Message received");
                self.emit(OutputEvent::Received(text));
            }
            Err(e) => {
                warn!(id = socket.id(), error = %e, "Dropping undecodable message");
                self.emit(OutputEvent::Errored);
            }
        }
    }

    fn emit(&self, event: OutputEvent) {
        (self.inner.sink)(event);
    }

    fn is_current(&self, socket: &Socket) -> bool {
        self.inner.generation.load(Ordering::Acquire) == socket.id()
    }
}

// ============================================================================
// Tests
// ============================================================================
