//! Shared helpers for transport integration tests.
//!
//! Provides a local WebSocket peer that records what the transport sends
//! and lets tests push frames back.

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chat_transport::{ConnectionState, OutputEvent, Readiness};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;

// ============================================================================
// Constants
// ============================================================================

/// Upper bound for any single wait in a test.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait before concluding that nothing else will arrive.
pub const QUIET_PERIOD: Duration = Duration::from_millis(150);

// ============================================================================
// TestServer
// ============================================================================

/// Bound WebSocket server waiting for the transport to connect.
pub struct TestServer {
    listener: TcpListener,
    port: u16,
}

impl TestServer {
    /// Binds to `127.0.0.1` on a random port.
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)).await?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    /// WebSocket URL of this server.
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/chat", self.port)
    }

    /// Accepts one client and completes the server side of the handshake.
    pub async fn accept(&self) -> Result<Peer> {
        let (stream, _) = timeout(STEP_TIMEOUT, self.listener.accept())
            .await
            .context("client never connected")??;
        let ws = tokio_tungstenite::accept_async(stream).await?;
        Ok(Peer { ws })
    }

    /// Accepts one TCP client without answering the WebSocket handshake.
    pub async fn accept_raw(&self) -> Result<TcpStream> {
        let (stream, _) = timeout(STEP_TIMEOUT, self.listener.accept())
            .await
            .context("client never connected")??;
        Ok(stream)
    }
}

/// Returns a `ws://` URL on a port nothing listens on.
pub async fn unused_ws_url() -> Result<String> {
    let server = TestServer::bind().await?;
    let url = server.ws_url();
    drop(server);
    Ok(url)
}

// ============================================================================
// Peer
// ============================================================================

/// Server side of an accepted connection.
pub struct Peer {
    ws: WebSocketStream<TcpStream>,
}

impl Peer {
    /// Next data or close frame, skipping ping/pong.
    pub async fn recv(&mut self) -> Result<Message> {
        loop {
            let message = timeout(STEP_TIMEOUT, self.ws.next())
                .await
                .context("peer timed out waiting for a frame")?
                .ok_or_else(|| anyhow!("stream ended"))??;
            match message {
                Message::Ping(_) | Message::Pong(_) => continue,
                other => return Ok(other),
            }
        }
    }

    /// Next frame, which must be binary.
    pub async fn recv_binary(&mut self) -> Result<Vec<u8>> {
        match self.recv().await? {
            Message::Binary(bytes) => Ok(bytes.to_vec()),
            other => Err(anyhow!("expected binary frame, got {other:?}")),
        }
    }

    /// Next frame, which must be a close frame.
    pub async fn recv_close(&mut self) -> Result<Option<CloseFrame>> {
        match self.recv().await? {
            Message::Close(frame) => Ok(frame),
            other => Err(anyhow!("expected close frame, got {other:?}")),
        }
    }

    /// Reads until the stream ends, which flushes the close reply.
    pub async fn drain(&mut self) {
        while let Ok(Some(Ok(_))) = timeout(STEP_TIMEOUT, self.ws.next()).await {}
    }

    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.ws.send(Message::text(text.to_owned())).await?;
        Ok(())
    }

    pub async fn send_binary(&mut self, bytes: &[u8]) -> Result<()> {
        self.ws.send(Message::binary(bytes.to_vec())).await?;
        Ok(())
    }

    /// Starts a server-side close.
    pub async fn close(&mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}

// ============================================================================
// Event Helpers
// ============================================================================

/// Next sink event, failing after [`STEP_TIMEOUT`].
pub async fn next_event(events: &mut mpsc::UnboundedReceiver<OutputEvent>) -> Result<OutputEvent> {
    timeout(STEP_TIMEOUT, events.recv())
        .await
        .context("no event within timeout")?
        .ok_or_else(|| anyhow!("sink channel closed"))
}

/// Asserts that no sink event arrives during [`QUIET_PERIOD`].
pub async fn assert_quiet(events: &mut mpsc::UnboundedReceiver<OutputEvent>) {
    if let Ok(Some(event)) = timeout(QUIET_PERIOD, events.recv()).await {
        panic!("unexpected event: {event:?}");
    }
}

/// Waits until the observed readiness equals `expected`.
pub async fn wait_for_readiness(
    state: &mut watch::Receiver<ConnectionState>,
    expected: Readiness,
) -> Result<()> {
    timeout(STEP_TIMEOUT, state.wait_for(|s| s.readiness == expected))
        .await
        .with_context(|| format!("readiness never became {expected}"))??;
    Ok(())
}

/// Installs a test subscriber honoring `RUST_LOG`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
