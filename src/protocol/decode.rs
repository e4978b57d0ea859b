//! Inbound payload decoding.
//!
//! Text frames, in-memory binary buffers and blobs all converge on a single
//! text value. Buffers and text decode immediately; blobs have to be read
//! first, so [`decode`] hands back a future for them instead of blocking
//! the event loop.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::Cursor;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::DecodePolicy;
use crate::error::Result;

// ============================================================================
// Blob
// ============================================================================

/// Binary payload that must be read asynchronously before decoding.
pub struct Blob {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    size_hint: usize,
}

impl Blob {
    /// Wraps bytes that are already in memory.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let size_hint = bytes.len();
        Self {
            reader: Box::new(Cursor::new(bytes)),
            size_hint,
        }
    }

    /// Wraps an arbitrary async reader.
    #[must_use]
    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            size_hint: 0,
        }
    }

    /// Reads the whole blob.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the underlying reader fails.
    pub async fn read_all(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size_hint);
        self.reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("size_hint", &self.size_hint)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// InboundPayload
// ============================================================================

/// Payload of one inbound message frame.
#[derive(Debug)]
pub enum InboundPayload {
    /// Text frame.
    Text(String),
    /// Binary frame delivered as an in-memory buffer.
    Buffer(Vec<u8>),
    /// Binary frame delivered as a blob.
    Blob(Blob),
}

// ============================================================================
// Decoded
// ============================================================================

/// Result of [`decode`]: available now, or after the returned future resolves.
pub enum Decoded {
    /// Decoding finished synchronously.
    Ready(Result<String>),
    /// Decoding needs an asynchronous read first.
    Pending(BoxFuture<'static, Result<String>>),
}

impl Decoded {
    /// Returns `true` if no asynchronous step is needed.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Converts either variant into a future.
    #[must_use]
    pub fn into_future(self) -> BoxFuture<'static, Result<String>> {
        match self {
            Self::Ready(result) => futures_util::future::ready(result).boxed(),
            Self::Pending(future) => future,
        }
    }
}

impl fmt::Debug for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes an inbound payload to text.
#[must_use]
pub fn decode(payload: InboundPayload, policy: DecodePolicy) -> Decoded {
    match payload {
        InboundPayload::Text(text) => Decoded::Ready(Ok(text)),
        InboundPayload::Buffer(bytes) => Decoded::Ready(decode_bytes(bytes, policy)),
        InboundPayload::Blob(blob) => Decoded::Pending(
            async move {
                let bytes = blob.read_all().await?;
                decode_bytes(bytes, policy)
            }
            .boxed(),
        ),
    }
}

/// Decodes UTF-8 bytes according to `policy`.
///
/// # Errors
///
/// Returns [`Error::InvalidUtf8`](crate::Error::InvalidUtf8) under
/// [`DecodePolicy::Strict`] when `bytes` is not valid UTF-8.
pub fn decode_bytes(bytes: Vec<u8>, policy: DecodePolicy) -> Result<String> {
    match policy {
        DecodePolicy::Strict => Ok(String::from_utf8(bytes)?),
        DecodePolicy::Replace => Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use crate::error::Error;

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")))
        }
    }

    fn ready_text(decoded: Decoded) -> String {
        match decoded {
            Decoded::Ready(Ok(text)) => text,
            other => panic!("expected ready text, got {other:?}"),
        }
    }

    #[test]
    fn test_text_passes_through_with_terminator() {
        let decoded = decode(
            InboundPayload::Text("WELCOME\r\n".into()),
            DecodePolicy::Replace,
        );
        assert_eq!(ready_text(decoded), "WELCOME\r\n");
    }

    #[test]
    fn test_buffer_and_text_converge() {
        let from_text = decode(InboundPayload::Text("PONG".into()), DecodePolicy::Strict);
        let from_buffer = decode(InboundPayload::Buffer(b"PONG".to_vec()), DecodePolicy::Strict);
        assert_eq!(ready_text(from_text), ready_text(from_buffer));
    }

    #[test]
    fn test_replace_policy_substitutes() {
        let decoded = decode(
            InboundPayload::Buffer(vec![b'o', b'k', 0xc3]),
            DecodePolicy::Replace,
        );
        assert_eq!(ready_text(decoded), "ok\u{FFFD}");
    }

    #[test]
    fn test_strict_policy_rejects() {
        let decoded = decode(InboundPayload::Buffer(vec![0xff, 0xfe]), DecodePolicy::Strict);
        assert!(matches!(decoded, Decoded::Ready(Err(Error::InvalidUtf8(_)))));
    }

    #[test]
    fn test_blob_is_pending_then_decodes() {
        let decoded = decode(
            InboundPayload::Blob(Blob::from_bytes("PONG".into())),
            DecodePolicy::Replace,
        );
        assert!(!decoded.is_ready());

        let text = tokio_test::block_on(decoded.into_future()).unwrap();
        assert_eq!(text, "PONG");
    }

    #[test]
    fn test_blob_read_failure_is_io_error() {
        let decoded = decode(
            InboundPayload::Blob(Blob::from_reader(FailingReader)),
            DecodePolicy::Replace,
        );
        let result = tokio_test::block_on(decoded.into_future());
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_ready_into_future() {
        let decoded = decode(InboundPayload::Text("x".into()), DecodePolicy::Replace);
        assert!(decoded.is_ready());
        assert_eq!(tokio_test::block_on(decoded.into_future()).unwrap(), "x");
    }
}
