//! Canonical error and result types for the crate.
//!
//! `NciError` covers the local, recoverable failures an upstream call can hit
//! before anything reaches the controller. Protocol-level and channel-fatal
//! conditions are never returned here; they surface as events.

use std::io;

use thiserror::Error;

use crate::{codec::FrameError, state::NfcState, status::Status};

/// Failure returned synchronously by an engine operation.
#[derive(Debug, Error)]
pub enum NciError {
    /// The engine is not in a state that accepts the call.
    #[error("operation not permitted in state {0}")]
    NotInitialized(NfcState),
    /// An identical operation is already pending.
    #[error("operation already pending")]
    Busy,
    /// An argument failed validation.
    #[error("invalid parameter: {0}")]
    InvalidParam(&'static str),
    /// No free control block or vendor slot is left.
    #[error("no free {0} available")]
    NoBuffers(&'static str),
    /// The connection handle or id does not name a live connection.
    #[error("unknown connection handle")]
    BadHandle,
    /// The connection is not in a state that allows the operation.
    #[error("connection is not open")]
    WrongProtocol,
    /// The transport refused to hand over control.
    #[error("request refused")]
    Refused,
    /// The operation could not be carried out.
    #[error("operation failed: {0}")]
    Failed(&'static str),
    /// A packet could not be built.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    /// The transport reported an I/O failure.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

impl NciError {
    /// Status code a caller would see for this failure.
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::NotInitialized(_) => Status::NOT_INITIALIZED,
            Self::Busy => Status::BUSY,
            Self::InvalidParam(_) => Status::INVALID_PARAM,
            Self::NoBuffers(_) => Status::NO_BUFFERS,
            Self::BadHandle => Status::BAD_HANDLE,
            Self::WrongProtocol => Status::WRONG_PROTOCOL,
            Self::Refused => Status::REFUSED,
            Self::Failed(_) => Status::FAILED,
            Self::Frame(FrameError::OversizedPayload { .. }) => Status::MSG_SIZE_TOO_BIG,
            Self::Frame(_) => Status::BAD_LENGTH,
            Self::Transport(_) => Status::FAILED,
        }
    }
}

/// Canonical result alias used by `ncilink` public APIs.
pub type Result<T> = std::result::Result<T, NciError>;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::NciError;
    use crate::{codec::FrameError, state::NfcState, status::Status};

    #[rstest]
    #[case(NciError::Busy, Status::BUSY)]
    #[case(NciError::NotInitialized(NfcState::Uninitialized), Status::NOT_INITIALIZED)]
    #[case(NciError::NoBuffers("control block"), Status::NO_BUFFERS)]
    #[case(
        NciError::Frame(FrameError::OversizedPayload { size: 300, max: 255 }),
        Status::MSG_SIZE_TOO_BIG
    )]
    #[case(NciError::Transport(std::io::Error::other("gone")), Status::FAILED)]
    fn maps_errors_to_status(#[case] err: NciError, #[case] expected: Status) {
        assert_eq!(err.status(), expected);
    }

    #[test]
    fn display_names_state() {
        let err = NciError::NotInitialized(NfcState::CoreInit);
        assert_eq!(err.to_string(), "operation not permitted in state CORE_INIT");
    }
}
