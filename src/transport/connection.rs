//! Per-connection handle and event loop.
//!
//! Every `connect` creates one [`Socket`] and spawns one tokio task that
//! owns the WebSocket stream. The task handles:
//!
//! - The opening handshake (with optional deadline)
//! - Inbound frames, forwarded to the transport as [`SocketEvent`]s
//! - Outbound frames and close requests from the public API
//! - The close handshake (with deadline)
//!
//! The handle side only holds readiness, listeners and the command sender,
//! so it can be cloned freely into listener contexts.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until, timeout};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message, Utf8Bytes};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use crate::config::{BinaryType, TransportConfig};
use crate::error::{Error, Result};
use crate::protocol::{Blob, EventKind, InboundPayload};
use crate::state::Readiness;

use super::core::{Transport, TransportInner};
use super::listener::{Listener, ListenerRegistry};

// ============================================================================
// Constants
// ============================================================================

/// Close code sent by `close`.
pub const CLOSE_CODE: CloseCode = CloseCode::Normal;

/// Close reason sent by `close`.
pub const CLOSE_REASON: &str = "client quit";

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Internal commands for the event loop.
pub(crate) enum SocketCommand {
    /// Transmit an already framed message.
    Frame(Vec<u8>),
    /// Start the close handshake.
    Close,
    /// Drop the stream without a close handshake.
    Abandon,
}

/// Occurrence on the underlying connection, before normalization.
#[derive(Debug)]
pub(crate) enum SocketEvent {
    Open,
    Close,
    Error,
    Message(InboundPayload),
}

impl SocketEvent {
    /// Listener list this event fires.
    pub(crate) fn kind(&self) -> EventKind {
        match self {
            Self::Open => EventKind::Open,
            Self::Close => EventKind::Close,
            Self::Error => EventKind::Error,
            Self::Message(_) => EventKind::Message,
        }
    }
}

// ============================================================================
// Socket
// ============================================================================

struct SocketInner {
    /// Generation number assigned by the transport.
    id: u64,
    /// Address passed to `connect`.
    address: String,
    /// Readiness of this connection.
    readiness: Mutex<Readiness>,
    /// Channel to the event loop.
    command_tx: mpsc::UnboundedSender<SocketCommand>,
    /// Listeners registered while this socket was current.
    listeners: Mutex<ListenerRegistry>,
    /// Set once `close` released this socket from the transport.
    released: AtomicBool,
}

/// Handle to one underlying connection.
///
/// Listeners see it through [`ListenerContext::socket`](super::ListenerContext::socket).
/// It exposes identity and readiness only; writing and closing go through
/// the transport so framing always applies.
#[derive(Clone)]
pub struct Socket {
    inner: Arc<SocketInner>,
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("id", &self.inner.id)
            .field("address", &self.inner.address)
            .field("readiness", &self.readiness())
            .finish()
    }
}

impl Socket {
    /// Creates a socket in the `Connecting` state and its command receiver.
    pub(crate) fn new(
        id: u64,
        address: String,
    ) -> (Self, mpsc::UnboundedReceiver<SocketCommand>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let socket = Self {
            inner: Arc::new(SocketInner {
                id,
                address,
                readiness: Mutex::new(Readiness::Connecting),
                command_tx,
                listeners: Mutex::new(ListenerRegistry::default()),
                released: AtomicBool::new(false),
            }),
        };
        (socket, command_rx)
    }

    /// Connection generation, unique per transport.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Address this socket was opened with.
    #[inline]
    #[must_use]
    pub fn address(&self) -> &str {
        &self.inner.address
    }

    /// Current readiness.
    #[inline]
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        *self.inner.readiness.lock()
    }

    /// Number of registered listeners across all kinds.
    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    pub(crate) fn set_readiness(&self, readiness: Readiness) {
        let previous = std::mem::replace(&mut *self.inner.readiness.lock(), readiness);
        if previous != readiness {
            trace!(id = self.inner.id, from = %previous, to = %readiness, "Readiness changed");
        }
    }

    /// Marks this socket as released by `close`.
    ///
    /// A released socket keeps reporting its final events after a newer
    /// `connect` has taken over.
    pub(crate) fn mark_released(&self) {
        self.inner.released.store(true, Ordering::Release);
    }

    pub(crate) fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    pub(crate) fn register(&self, kind: EventKind, listener: Listener) {
        self.inner.listeners.lock().register(kind, listener);
    }

    /// Clones the listener list so no lock is held while they run.
    pub(crate) fn listeners(&self, kind: EventKind) -> Vec<Listener> {
        self.inner.listeners.lock().snapshot(kind)
    }

    pub(crate) fn send_frame(&self, bytes: Vec<u8>) -> Result<()> {
        self.command(SocketCommand::Frame(bytes))
    }

    pub(crate) fn request_close(&self) -> Result<()> {
        self.command(SocketCommand::Close)
    }

    pub(crate) fn abandon(&self) {
        let _ = self.command(SocketCommand::Abandon);
    }

    fn command(&self, command: SocketCommand) -> Result<()> {
        self.inner
            .command_tx
            .send(command)
            .map_err(|_| Error::ConnectionClosed)
    }
}

// ============================================================================
// Event Loop
// ============================================================================

impl Socket {
    /// Drives one connection from handshake to close.
    pub(crate) async fn run_event_loop(
        self,
        mut command_rx: mpsc::UnboundedReceiver<SocketCommand>,
        transport: Weak<TransportInner>,
        config: TransportConfig,
    ) {
        let id = self.id();

        let handshake = Self::handshake(self.address().to_owned(), config.connect_timeout);
        tokio::pin!(handshake);

        let ws_stream = loop {
            tokio::select! {
                result = &mut handshake => break result,

                command = command_rx.recv() => match command {
                    Some(SocketCommand::Frame(_)) => {
                        trace!(id, "Dropping frame queued before open");
                    }
                    Some(SocketCommand::Close) => {
                        debug!(id, "Close requested during handshake");
                        self.set_readiness(Readiness::Closed);
                        emit(&transport, &self, SocketEvent::Close);
                        return;
                    }
                    Some(SocketCommand::Abandon) | None => {
                        debug!(id, "Connection abandoned during handshake");
                        return;
                    }
                },
            }
        };

        let ws_stream = match ws_stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!(id, address = %self.address(), error = %e, "WebSocket connection failed");
                self.set_readiness(Readiness::Closed);
                emit(&transport, &self, SocketEvent::Error);
                emit(&transport, &self, SocketEvent::Close);
                return;
            }
        };

        debug!(id, address = %self.address(), "WebSocket connection established");
        self.set_readiness(Readiness::Open);
        emit(&transport, &self, SocketEvent::Open);

        let (mut ws_write, mut ws_read) = ws_stream.split();
        let mut close_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                // Incoming frames from the peer
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            trace!(id, len = text.len(), "Text frame received");
                            let payload = InboundPayload::Text(text.as_str().to_owned());
                            emit(&transport, &self, SocketEvent::Message(payload));
                        }

                        Some(Ok(Message::Binary(bytes))) => {
                            trace!(id, len = bytes.len(), "Binary frame received");
                            let payload = match config.binary_type {
                                BinaryType::ArrayBuffer => InboundPayload::Buffer(bytes.to_vec()),
                                BinaryType::Blob => InboundPayload::Blob(Blob::from_bytes(bytes.to_vec())),
                            };
                            emit(&transport, &self, SocketEvent::Message(payload));
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(id, ?frame, "Close frame received");
                            if self.readiness() == Readiness::Open {
                                self.set_readiness(Readiness::Closing);
                                refresh(&transport, &self);
                            }
                        }

                        Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                            debug!(id, "WebSocket stream ended");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(id, error = %e, "WebSocket error");
                            self.set_readiness(Readiness::Closed);
                            emit(&transport, &self, SocketEvent::Error);
                            break;
                        }

                        // Ping/Pong are answered by tungstenite
                        Some(Ok(_)) => {}
                    }
                }

                // Commands from the public API
                command = command_rx.recv() => {
                    match command {
                        Some(SocketCommand::Frame(bytes)) => {
                            let len = bytes.len();
                            if let Err(e) = ws_write.send(Message::Binary(bytes.into())).await {
                                warn!(id, error = %e, "Failed to send frame");
                            } else {
                                trace!(id, len, "Frame sent");
                            }
                        }

                        Some(SocketCommand::Close) if close_deadline.is_some() => {
                            trace!(id, "Close already in progress");
                        }

                        Some(SocketCommand::Close) => {
                            debug!(id, code = u16::from(CLOSE_CODE), reason = CLOSE_REASON, "Sending close frame");
                            let frame = CloseFrame {
                                code: CLOSE_CODE,
                                reason: Utf8Bytes::from_static(CLOSE_REASON),
                            };
                            if let Err(e) = ws_write.send(Message::Close(Some(frame))).await {
                                debug!(id, error = %e, "Close frame not delivered");
                                break;
                            }
                            close_deadline = Some(Instant::now() + config.close_timeout);
                        }

                        Some(SocketCommand::Abandon) | None => {
                            debug!(id, "Connection abandoned");
                            return;
                        }
                    }
                }

                // Peer never answered our close frame
                () = wait_until(close_deadline) => {
                    warn!(
                        id,
                        timeout_ms = u64::try_from(config.close_timeout.as_millis()).unwrap_or(u64::MAX),
                        "Close handshake timed out"
                    );
                    break;
                }
            }
        }

        self.set_readiness(Readiness::Closed);
        emit(&transport, &self, SocketEvent::Close);

        debug!(id, "Event loop terminated");
    }

    /// Opens the WebSocket, bounded by `connect_timeout` when set.
    async fn handshake(address: String, connect_timeout: Option<Duration>) -> Result<WsStream> {
        let connect = tokio_tungstenite::connect_async(address);

        let (stream, response) = match connect_timeout {
            Some(limit) => timeout(limit, connect).await.map_err(|_| {
                Error::connection_timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))
            })??,
            None => connect.await?,
        };

        trace!(status = %response.status(), "Handshake response");
        Ok(stream)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Forwards an event to the transport if it still exists.
fn emit(transport: &Weak<TransportInner>, socket: &Socket, event: SocketEvent) {
    match Transport::upgrade(transport) {
        Some(transport) => transport.dispatch(socket, event),
        None => trace!(id = socket.id(), kind = %event.kind(), "Transport dropped, event discarded"),
    }
}

fn refresh(transport: &Weak<TransportInner>, socket: &Socket) {
    if let Some(transport) = Transport::upgrade(transport) {
        transport.refresh_state(socket);
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
