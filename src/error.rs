//! Error types for telemetry decoding and race reconstruction.
//!
//! Two layers of errors exist in paddock:
//!
//! - [`DecodeError`] is local to a single packet. It is never fatal: the packet
//!   stream drops the offending packet and carries on with the next frame.
//! - [`TelemetryError`] covers everything that can stop an operation as a whole:
//!   unreadable capture files, corrupt framing, settings that fail to parse, and
//!   capture sockets that cannot be bound.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use paddock::TelemetryError;
//!
//! let error = TelemetryError::capture_failed("socket closed");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```
//!
//! ## Helper Constructors
//!
//! ```rust
//! use paddock::TelemetryError;
//! use std::path::PathBuf;
//!
//! let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
//! let file_error = TelemetryError::file_error(PathBuf::from("/path/to/race.capture"), io_err);
//!
//! let framing = TelemetryError::framing_error(4096, 1367, 12);
//! assert!(!framing.is_retryable());
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::protocol::PacketKind;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Reasons a single packet buffer could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("No packet layout is {0} bytes long")]
    UnknownLength(usize),

    #[error("Packet type mismatch: {expected:?} layout carries type tag {found}")]
    TypeMismatch { expected: PacketKind, found: u8 },

    #[error("Read of {needed} bytes at offset {offset} overruns {len}-byte buffer")]
    Truncated { offset: usize, needed: usize, len: usize },
}

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Capture file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Corrupt framing at byte {offset}: frame declares {declared} bytes, only {remaining} remain"
    )]
    Framing { offset: u64, declared: usize, remaining: usize },

    #[error("Packet decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Configuration error in {context}: {details}")]
    Config { context: String, details: String },

    #[error("Telemetry capture failed: {reason}")]
    Capture {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::Capture { .. } => true,
            TelemetryError::Timeout { .. } => true,
            TelemetryError::File { .. } => false,
            TelemetryError::Framing { .. } => false,
            TelemetryError::Decode(_) => false,
            TelemetryError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::File { .. } => vec![
                "Check the capture file exists and is readable",
                "Verify the path points at a framed capture, not a packet directory",
                "Check file permissions",
            ],
            TelemetryError::Framing { .. } => vec![
                "Re-capture the session; the file lost synchronization",
                "Truncate the capture at the reported offset to salvage earlier races",
            ],
            TelemetryError::Decode(_) => vec![
                "Check the simulator broadcasts the Project CARS 1 UDP format",
                "Discard the packet and continue with the next frame",
            ],
            TelemetryError::Config { .. } => vec![
                "Check the settings document is valid JSON or YAML",
                "Compare field names against the documented settings keys",
            ],
            TelemetryError::Capture { .. } => vec![
                "Ensure the UDP port is not used by another listener",
                "Check the simulator UDP broadcast setting is enabled",
                "Verify firewall rules allow inbound UDP traffic",
            ],
            TelemetryError::Timeout { .. } => vec![
                "Increase timeout duration",
                "Verify the simulator is broadcasting telemetry",
            ],
        }
    }

    /// Helper constructor for file errors.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TelemetryError::File { path, source }
    }

    /// Helper constructor for corrupt framing.
    pub fn framing_error(offset: u64, declared: usize, remaining: usize) -> Self {
        TelemetryError::Framing { offset, declared, remaining }
    }

    /// Helper constructor for settings errors.
    pub fn config_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::Config { context: context.into(), details: details.into() }
    }

    /// Helper constructor for capture failures.
    pub fn capture_failed(reason: impl Into<String>) -> Self {
        TelemetryError::Capture { reason: reason.into(), source: None }
    }

    /// Helper constructor for capture failures caused by an I/O error.
    pub fn capture_io(reason: impl Into<String>, source: std::io::Error) -> Self {
        TelemetryError::Capture { reason: reason.into(), source: Some(Box::new(source)) }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn error_messages_carry_their_context(
            reason in ".*",
            offset in 0u64..0x1_0000_0000u64,
            declared in 0usize..=65535usize,
            remaining in 0usize..=65535usize,
            len in 0usize..4096usize
        ) {
            let capture = TelemetryError::capture_failed(reason.clone());
            prop_assert!(capture.to_string().contains(&reason));

            let framing = TelemetryError::framing_error(offset, declared, remaining);
            let message = framing.to_string();
            prop_assert!(message.contains(&offset.to_string()));
            prop_assert!(message.contains(&declared.to_string()));
            prop_assert!(message.contains(&remaining.to_string()));

            let decode: TelemetryError = DecodeError::UnknownLength(len).into();
            prop_assert!(decode.to_string().contains(&len.to_string()));
        }

        #[test]
        fn capture_source_chain_is_preserved(base_message in "[a-z ]{1,40}") {
            let io = std::io::Error::other(base_message.clone());
            let error = TelemetryError::capture_io("recv failed", io);

            let source = std::error::Error::source(&error);
            prop_assert!(source.is_some());
            prop_assert!(source.map(|s| s.to_string().contains(&base_message)).unwrap_or(false));
        }
    }

    #[test]
    fn decode_errors_describe_the_failure() {
        let mismatch = DecodeError::TypeMismatch { expected: PacketKind::Telemetry, found: 2 };
        assert!(mismatch.to_string().contains("Telemetry"));
        assert!(mismatch.to_string().contains('2'));

        let truncated = DecodeError::Truncated { offset: 1366, needed: 4, len: 1367 };
        assert!(truncated.to_string().contains("1366"));
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<TelemetryError>();
        assert_send_sync_static::<DecodeError>();
    }

    #[test]
    fn recovery_methods_work() {
        let capture = TelemetryError::capture_failed("test");
        let framing = TelemetryError::framing_error(0, 1367, 3);
        let config = TelemetryError::config_error("settings", "missing key");

        assert!(capture.is_retryable());
        assert!(!framing.is_retryable());
        assert!(!config.is_retryable());

        for error in [&capture, &framing, &config] {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            for suggestion in suggestions {
                assert!(suggestion.len() > 5);
            }
        }
    }

    #[test]
    fn from_conversions_work() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "race.capture");
        match TelemetryError::from(io_err) {
            TelemetryError::File { source, .. } => assert_eq!(source.to_string(), "race.capture"),
            other => panic!("Expected File error variant, got {other:?}"),
        }

        let decode = TelemetryError::from(DecodeError::UnknownLength(12));
        assert!(matches!(decode, TelemetryError::Decode(DecodeError::UnknownLength(12))));
    }
}
