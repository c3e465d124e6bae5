//! Metric helpers for `ncilink`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers do nothing.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

use crate::codec::MessageType;

/// Name of the counter tracking packets crossing the transport.
pub const FRAMES_TOTAL: &str = "ncilink_frames_total";
/// Name of the counter tracking dropped packets and unmatched responses.
pub const PROTOCOL_ERRORS_TOTAL: &str = "ncilink_protocol_errors_total";
/// Name of the counter tracking command response timeouts.
pub const COMMAND_TIMEOUTS_TOTAL: &str = "ncilink_command_timeouts_total";
/// Name of the counter tracking recovery attempts.
pub const RECOVERIES_TOTAL: &str = "ncilink_recoveries_total";
/// Name of the gauge tracking allocated control blocks.
pub const CONNECTIONS_OPEN: &str = "ncilink_connections_open";

/// Direction of packet processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Packets received from the controller.
    Inbound,
    /// Packets written to the controller.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Record a packet for the given direction and message type.
#[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
pub fn inc_frames(direction: Direction, kind: MessageType) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_TOTAL, "direction" => direction.as_str(), "kind" => kind.as_str())
        .increment(1);
}

/// Record a protocol-level error.
pub fn inc_protocol_errors() {
    #[cfg(feature = "metrics")]
    counter!(PROTOCOL_ERRORS_TOTAL).increment(1);
}

/// Record a command timeout.
pub fn inc_command_timeouts() {
    #[cfg(feature = "metrics")]
    counter!(COMMAND_TIMEOUTS_TOTAL).increment(1);
}

/// Record the outcome of a recovery attempt.
#[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
pub fn inc_recoveries(succeeded: bool) {
    #[cfg(feature = "metrics")]
    counter!(RECOVERIES_TOTAL, "outcome" => if succeeded { "ok" } else { "failed" })
        .increment(1);
}

/// Increment the open connections gauge.
pub fn inc_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_OPEN).increment(1.0);
}

/// Decrement the open connections gauge.
pub fn dec_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_OPEN).decrement(1.0);
}
