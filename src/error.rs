//! Error types for the RGA client.
//!
//! Every fallible operation in the crate returns [`RgaResult`]. The taxonomy
//! separates four kinds of failure so callers can pick a recovery policy:
//!
//! - **Transport** (`Transport`, `ConnectionClosed`, `Timeout`): the byte stream
//!   failed. The session is unusable and the caller should reconnect.
//! - **Protocol** (`Protocol`): the bytes arrived but could not be framed or
//!   decoded. There is no resynchronisation marker in the stream, so this is
//!   also treated as fatal, except for [`ProtocolError::UnknownEvent`] which a
//!   caller may choose to skip while draining events.
//! - **Instrument** (`Instrument`): a well-formed `ERROR` reply. The instrument
//!   rejected the command; the connection is still in sync.
//! - **Handshake** (`Handshake`): the first frame did not carry the
//!   identification token.
//!
//! Configuration and recorder lifecycle errors live here as well so the binary
//! can use a single error type up to the `anyhow` boundary.

use std::fmt;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type RgaResult<T> = std::result::Result<T, RgaError>;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum RgaError {
    /// I/O failure on the instrument stream.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The instrument closed the stream.
    #[error("Connection closed by instrument")]
    ConnectionClosed,

    /// No frame arrived within the read or connect deadline.
    #[error("Timed out after {0:?} waiting for the instrument")]
    Timeout(std::time::Duration),

    /// Bytes could not be framed or decoded.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The instrument answered with an `ERROR` status.
    #[error("Instrument error: {0}")]
    Instrument(#[from] InstrumentError),

    /// The identification reply did not start with `MKSRGA`.
    #[error("Handshake failed: expected MKSRGA, received {received:?}")]
    Handshake {
        /// First row of the frame that was received instead.
        received: String,
    },

    /// Configuration sources could not be merged or extracted.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Configuration values were read but rejected by validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// `SensorState` did not report `InUse` before recording.
    #[error("Sensor is not ready for acquisition (state: {state})")]
    SensorNotReady {
        /// State token reported by the instrument.
        state: String,
    },

    /// `start` was called while a recording is running.
    #[error("Recording already in progress")]
    AlreadyRecording,

    /// `stop` was called with no recording running.
    #[error("Recording already stopped")]
    AlreadyStopped,

    /// A cancellation flag was raised while draining events.
    #[error("Operation cancelled")]
    Cancelled,
}

impl RgaError {
    /// Whether the session must be discarded after this error.
    ///
    /// Instrument rejections and unknown asynchronous events leave the stream
    /// aligned on a frame boundary; everything else that touches the wire does not.
    pub fn is_connection_fatal(&self) -> bool {
        match self {
            RgaError::Transport(_)
            | RgaError::ConnectionClosed
            | RgaError::Timeout(_)
            | RgaError::Handshake { .. } => true,
            RgaError::Protocol(err) => !matches!(err, ProtocolError::UnknownEvent(_)),
            RgaError::Instrument(_)
            | RgaError::Config(_)
            | RgaError::Configuration(_)
            | RgaError::SensorNotReady { .. }
            | RgaError::AlreadyRecording
            | RgaError::AlreadyStopped
            | RgaError::Cancelled => false,
        }
    }

    /// True when the error is a classification failure for an unsolicited frame.
    pub fn is_unknown_event(&self) -> bool {
        matches!(self, RgaError::Protocol(ProtocolError::UnknownEvent(_)))
    }

    /// Returns the instrument rejection, if this error carries one.
    pub fn as_instrument(&self) -> Option<&InstrumentError> {
        match self {
            RgaError::Instrument(err) => Some(err),
            _ => None,
        }
    }
}

impl From<figment::Error> for RgaError {
    fn from(err: figment::Error) -> Self {
        RgaError::Config(Box::new(err))
    }
}

/// Framing or decoding failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The buffer filled up before a frame terminator was seen.
    #[error("no frame terminator within {capacity} bytes")]
    MissingTerminator {
        /// Buffer size of the tier used for the read.
        capacity: usize,
    },

    /// A terminator arrived with no rows before it.
    #[error("empty frame")]
    EmptyFrame,

    /// The status row carried neither `OK` nor `ERROR`.
    #[error("unexpected status token {token:?} in reply to {command}")]
    UnexpectedStatus {
        /// Command named on the status row.
        command: String,
        /// Token found where the status was expected.
        token: String,
    },

    /// The reply names a different command than the one just sent.
    #[error("expected reply to {expected}, received {received:?}")]
    UnexpectedReply {
        /// Command that was written.
        expected: String,
        /// Leading token of the frame that arrived.
        received: String,
    },

    /// A row does not have the shape its layout requires.
    #[error("malformed row {row}: {reason}")]
    MalformedRow {
        /// Zero-based row index within the frame.
        row: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A token could not be converted to the type a field needs.
    #[error("field {field}: cannot read {token:?} as {expected}")]
    InvalidField {
        /// Field name.
        field: String,
        /// Raw token.
        token: String,
        /// Name of the expected type.
        expected: &'static str,
    },

    /// An unsolicited frame whose leading token is not a known event.
    #[error("unknown asynchronous event {0:?}")]
    UnknownEvent(String),
}

/// A well-formed `ERROR` reply from the instrument.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct InstrumentError {
    /// Command named on the status row.
    pub command: String,
    /// Structured error code (second token of the code row).
    pub code: String,
    /// Free-text description, tokens joined with single spaces.
    pub description: String,
}

impl fmt::Display for InstrumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rejected with code {}: {}",
            self.command, self.code, self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_errors_are_recoverable() {
        let err = RgaError::from(InstrumentError {
            command: "Select".into(),
            code: "12".into(),
            description: "bad serial".into(),
        });
        assert!(!err.is_connection_fatal());
        assert_eq!(err.as_instrument().map(|e| e.code.as_str()), Some("12"));
        assert_eq!(
            err.to_string(),
            "Instrument error: Select rejected with code 12: bad serial"
        );
    }

    #[test]
    fn unknown_event_is_distinct_from_malformed_frame() {
        let unknown = RgaError::from(ProtocolError::UnknownEvent("Bogus".into()));
        let malformed = RgaError::from(ProtocolError::MalformedRow {
            row: 2,
            reason: "too few values".into(),
        });

        assert!(unknown.is_unknown_event());
        assert!(!unknown.is_connection_fatal());
        assert!(!malformed.is_unknown_event());
        assert!(malformed.is_connection_fatal());
    }

    #[test]
    fn transport_failures_are_fatal() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert!(RgaError::from(io).is_connection_fatal());
        assert!(RgaError::ConnectionClosed.is_connection_fatal());
        assert!(RgaError::Handshake {
            received: "HELLO".into()
        }
        .is_connection_fatal());
    }

    #[test]
    fn mismatched_reply_is_fatal() {
        let err = RgaError::from(ProtocolError::UnexpectedReply {
            expected: "Release".into(),
            received: "MassReading".into(),
        });
        assert!(err.is_connection_fatal());
        assert_eq!(
            err.to_string(),
            "Protocol error: expected reply to Release, received \"MassReading\""
        );
    }
}
