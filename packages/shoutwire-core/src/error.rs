//! Centralized error types for the shoutwire core library.
//!
//! Every failure during a connection attempt maps to exactly one
//! [`ShoutError`] variant. Variants are grouped into four classes:
//! - transport failures (socket I/O, timeouts, premature close)
//! - protocol failures (malformed status line, missing or bad headers)
//! - classified failures (server explicitly reported a failure status)
//! - unclassified responses (no defined handling for the status)

use std::time::Duration;

use thiserror::Error;

/// Trait for error types that provide machine-readable error codes.
///
/// Codes are stable across releases and safe to match on in logs or tooling.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

/// Errors produced while connecting to or reading from a SHOUTcast stream.
#[derive(Debug, Error)]
pub enum ShoutError {
    /// Underlying transport failed (connection refused, reset, etc.).
    #[error("Transport error: {0}")]
    Io(#[from] std::io::Error),

    /// Server address could not be used to open a connection.
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// The handshake did not complete within the configured deadline.
    #[error("Handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// The server closed the connection before the expected data arrived.
    #[error("Connection closed after {received} bytes")]
    ConnectionClosed { received: usize },

    /// The response header block exceeded the configured maximum size.
    #[error("Response header block exceeds {limit} bytes")]
    HeaderTooLarge { limit: usize },

    /// The first line of the response was blank.
    #[error("Empty status line")]
    EmptyStatusLine,

    /// The status line did not contain a protocol token and a status code.
    #[error("Malformed status line: {0:?}")]
    MalformedStatusLine(String),

    /// The status code token was not an integer.
    #[error("Invalid status code: {0:?}")]
    InvalidStatusCode(String),

    /// A header required by the handshake was absent.
    #[error("Missing required header: {0}")]
    MissingHeader(&'static str),

    /// A header was present but its value could not be parsed.
    #[error("Invalid value for header {header}: {value:?}")]
    InvalidHeaderValue { header: &'static str, value: String },

    /// The server reported an explicit failure status (e.g. 404).
    #[error("Server responded with failure status {code}")]
    StatusFailure { code: i32 },

    /// The status line had no defined handling; the connection was refused.
    #[error("Could not connect: unhandled response {protocol} {code}")]
    Unclassified { protocol: String, code: i32 },

    /// The stream's content type is not a playable audio format.
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Bytes read as text were not valid UTF-8.
    #[error("Received text is not valid UTF-8")]
    InvalidText,

    /// The transport has already been disposed.
    #[error("Transport has been disposed")]
    Disposed,
}

impl ShoutError {
    /// Returns true for malformed-response errors (status line or headers).
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::HeaderTooLarge { .. }
                | Self::EmptyStatusLine
                | Self::MalformedStatusLine(_)
                | Self::InvalidStatusCode(_)
                | Self::MissingHeader(_)
                | Self::InvalidHeaderValue { .. }
        )
    }

    /// Returns the status code carried by a classified or unclassified failure.
    #[must_use]
    pub fn status_code(&self) -> Option<i32> {
        match self {
            Self::StatusFailure { code } | Self::Unclassified { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl ErrorCode for ShoutError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "transport_error",
            Self::InvalidUrl(_) => "invalid_url",
            Self::HandshakeTimeout(_) => "handshake_timeout",
            Self::ConnectionClosed { .. } => "connection_closed",
            Self::HeaderTooLarge { .. } => "header_too_large",
            Self::EmptyStatusLine => "empty_status_line",
            Self::MalformedStatusLine(_) => "malformed_status_line",
            Self::InvalidStatusCode(_) => "invalid_status_code",
            Self::MissingHeader(_) => "missing_header",
            Self::InvalidHeaderValue { .. } => "invalid_header_value",
            Self::StatusFailure { .. } => "status_failure",
            Self::Unclassified { .. } => "unclassified_response",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::InvalidText => "invalid_text",
            Self::Disposed => "disposed",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Type Aliases
// ─────────────────────────────────────────────────────────────────────────────

/// Convenient Result alias for shoutwire operations.
pub type ShoutResult<T> = Result<T, ShoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_failure_carries_code() {
        let err = ShoutError::StatusFailure { code: 404 };
        assert_eq!(err.code(), "status_failure");
        assert_eq!(err.status_code(), Some(404));
        assert!(!err.is_protocol_error());
    }

    #[test]
    fn unclassified_is_distinct_from_failure() {
        let err = ShoutError::Unclassified {
            protocol: "ICY".into(),
            code: 404,
        };
        assert_eq!(err.code(), "unclassified_response");
        assert_ne!(err.code(), ShoutError::StatusFailure { code: 404 }.code());
    }

    #[test]
    fn missing_header_is_protocol_error() {
        let err = ShoutError::MissingHeader("ICY-BR");
        assert!(err.is_protocol_error());
        assert_eq!(err.to_string(), "Missing required header: ICY-BR");
    }

    #[test]
    fn io_errors_convert_unchanged() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: ShoutError = io.into();
        match err {
            ShoutError::Io(inner) => {
                assert_eq!(inner.kind(), std::io::ErrorKind::ConnectionRefused)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
