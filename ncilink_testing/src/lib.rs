//! Test doubles and fixtures for exercising an [`ncilink::Engine`].
//!
//! [`ScriptedTransport`] stands in for the controller link and records
//! everything the engine asks of it, [`RecordingCallbacks`] captures the
//! events the engine reports upstream, and [`frames`] builds the controller
//! packets tests feed back in.
//!
//! ```rust
//! use ncilink::NfcState;
//! use ncilink_testing::enabled_engine;
//!
//! let (engine, transport, _events) = enabled_engine();
//! assert_eq!(engine.state(), NfcState::Idle);
//! assert!(transport.take_written().is_empty());
//! ```

pub mod fixtures;
pub mod frames;
pub mod logging;
pub mod metrics;
pub mod recorder;
pub mod transport;

pub use fixtures::{TestEngine, drive_enable, enabled_engine, engine_with};
pub use logging::{LoggerHandle, logger};
pub use recorder::RecordingCallbacks;
pub use transport::{ControllerLog, ScriptedTransport};

/// Result type for fallible tests.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
