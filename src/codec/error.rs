//! Error types for the NCI frame codec.
//!
//! Every failure is detected before any payload byte is interpreted, so a
//! rejected frame never leaves partially processed state behind.

use thiserror::Error;

/// Wire-level errors raised while encoding or decoding NCI packets.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer bytes than a full packet header were supplied.
    #[error("incomplete packet header: have {have}, need {need}")]
    IncompleteHeader {
        /// Bytes currently available.
        have: usize,
        /// Bytes required for a complete header.
        need: usize,
    },

    /// The header declares more payload than the buffer actually holds.
    #[error("truncated packet: header declares {declared} payload bytes, {available} available")]
    Truncated {
        /// Payload length taken from the header.
        declared: usize,
        /// Payload bytes actually present.
        available: usize,
    },

    /// A payload does not fit the one-byte length field.
    #[error("payload exceeds max length: {size} > {max}")]
    OversizedPayload {
        /// Attempted payload size.
        size: usize,
        /// Largest encodable payload.
        max: usize,
    },

    /// The message type bits hold a reserved value.
    #[error("unknown message type: {type_id}")]
    UnknownMessageType {
        /// Raw three-bit message type.
        type_id: u8,
    },

    /// Bytes follow the packet where exactly one packet was expected.
    #[error("{extra} bytes trail the packet")]
    TrailingBytes {
        /// Number of unexpected bytes.
        extra: usize,
    },

    /// A payload field ran past the end of the payload.
    #[error("field {field} overruns payload: need {need}, have {have}")]
    FieldOverrun {
        /// Field being read.
        field: &'static str,
        /// Bytes required by the field.
        need: usize,
        /// Bytes left in the payload.
        have: usize,
    },
}

impl FrameError {
    /// Returns the error category as a string for logging and metrics.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::IncompleteHeader { .. } | Self::Truncated { .. } => "truncated",
            Self::OversizedPayload { .. } | Self::TrailingBytes { .. } => "oversized",
            Self::UnknownMessageType { .. } => "unknown_type",
            Self::FieldOverrun { .. } => "bad_length",
        }
    }
}
