//! Transport configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use chat_transport::{BinaryType, DecodePolicy, TransportConfig};
//!
//! let config = TransportConfig::new()
//!     .with_connect_timeout(Duration::from_secs(10))
//!     .with_close_timeout(Duration::from_secs(2))
//!     .with_decode_policy(DecodePolicy::Strict);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.binary_type, BinaryType::ArrayBuffer);
//! ```
//!
//! Configurations can also be loaded from JSON; durations are given in
//! milliseconds and missing fields take their defaults:
//!
//! ```
//! use chat_transport::TransportConfig;
//!
//! let config = TransportConfig::from_json(r#"{ "close_timeout": 1500 }"#).unwrap();
//! assert_eq!(config.close_timeout.as_millis(), 1500);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default deadline for the opening handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default wait for the peer's close reply.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// BinaryType
// ============================================================================

/// How inbound binary frames are handed to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryType {
    /// In-memory byte buffer, decoded synchronously.
    #[default]
    ArrayBuffer,
    /// Opaque blob, read asynchronously before decoding.
    Blob,
}

// ============================================================================
// DecodePolicy
// ============================================================================

/// What to do with inbound bytes that are not valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodePolicy {
    /// Substitute U+FFFD for each invalid sequence.
    #[default]
    Replace,
    /// Drop the frame and report `Errored`.
    Strict,
}

// ============================================================================
// TransportConfig
// ============================================================================

/// Transport configuration options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Deadline for the opening handshake. `None` waits indefinitely.
    #[serde(with = "opt_duration_ms")]
    pub connect_timeout: Option<Duration>,

    /// How long `close` waits for the peer's close reply before dropping
    /// the stream.
    #[serde(with = "duration_ms")]
    pub close_timeout: Duration,

    /// Delivery mode for inbound binary frames.
    pub binary_type: BinaryType,

    /// Policy for invalid UTF-8 in inbound binary frames.
    pub decode_policy: DecodePolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl TransportConfig {
    /// Creates a configuration with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            binary_type: BinaryType::ArrayBuffer,
            decode_policy: DecodePolicy::Replace,
        }
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the document is malformed
    /// - [`Error::Config`] if validation fails
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl TransportConfig {
    /// Sets the opening handshake deadline.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Waits for the opening handshake without a deadline.
    #[inline]
    #[must_use]
    pub fn without_connect_timeout(mut self) -> Self {
        self.connect_timeout = None;
        self
    }

    /// Sets the close reply deadline.
    #[inline]
    #[must_use]
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Sets the binary frame delivery mode.
    #[inline]
    #[must_use]
    pub fn with_binary_type(mut self, binary_type: BinaryType) -> Self {
        self.binary_type = binary_type;
        self
    }

    /// Sets the invalid UTF-8 policy.
    #[inline]
    #[must_use]
    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl TransportConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::config(
                "connect_timeout must be greater than zero (omit it to wait indefinitely)",
            ));
        }
        if self.close_timeout.is_zero() {
            return Err(Error::config("close_timeout must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Serde Helpers
// ============================================================================

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod opt_duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => super::duration_ms::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.close_timeout, Duration::from_secs(5));
        assert_eq!(config.binary_type, BinaryType::ArrayBuffer);
        assert_eq!(config.decode_policy, DecodePolicy::Replace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = TransportConfig::new()
            .without_connect_timeout()
            .with_close_timeout(Duration::from_millis(250))
            .with_binary_type(BinaryType::Blob)
            .with_decode_policy(DecodePolicy::Strict);

        assert_eq!(config.connect_timeout, None);
        assert_eq!(config.close_timeout, Duration::from_millis(250));
        assert_eq!(config.binary_type, BinaryType::Blob);
        assert_eq!(config.decode_policy, DecodePolicy::Strict);
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let zero_connect = TransportConfig::new().with_connect_timeout(Duration::ZERO);
        assert!(matches!(zero_connect.validate(), Err(Error::Config { .. })));

        let zero_close = TransportConfig::new().with_close_timeout(Duration::ZERO);
        assert!(matches!(zero_close.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            TransportConfig::from_json(r#"{ "connect_timeout": null, "binary_type": "blob" }"#)
                .unwrap();
        assert_eq!(config.connect_timeout, None);
        assert_eq!(config.binary_type, BinaryType::Blob);
        assert_eq!(config.close_timeout, DEFAULT_CLOSE_TIMEOUT);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            TransportConfig::from_json(r#"{ "close_timeout": 0 }"#),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            TransportConfig::from_json("not json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_json_round_trip_uses_millis() {
        let json = serde_json::to_value(TransportConfig::default()).unwrap();
        assert_eq!(json["connect_timeout"], 30_000);
        assert_eq!(json["close_timeout"], 5_000);
        assert_eq!(json["decode_policy"], "replace");
    }
}
