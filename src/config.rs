//! Engine configuration.
//!
//! The values originate in configuration owned by the embedding stack and are
//! read once when an [`Engine`](crate::engine::Engine) is constructed.

use std::time::Duration;

use serde::Deserialize;

/// Number of fixed slots for asynchronous vendor notification callbacks.
pub const VENDOR_CALLBACK_SLOTS: usize = 3;

/// Smallest accepted command response timeout.
const MIN_COMMAND_TIMEOUT: Duration = Duration::from_millis(10);
/// Upper bound on control blocks, the RF connection included.
const MAX_CONNECTIONS: usize = 16;

/// Verbosity of the stack's own protocol trace.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TraceLevel {
    /// No protocol trace.
    None,
    /// Errors only.
    Error,
    /// Errors and warnings.
    Warning,
    /// Upstream API entry points.
    Api,
    /// Protocol events and state changes.
    #[default]
    Event,
    /// Packet dumps.
    Debug,
}

impl TraceLevel {
    /// Matching filter for a `log` backend.
    #[must_use]
    pub const fn level_filter(self) -> log::LevelFilter {
        match self {
            Self::None => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warning => log::LevelFilter::Warn,
            Self::Api | Self::Event => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
        }
    }

    /// Whether messages at `level` pass this setting.
    #[must_use]
    pub fn allows(self, level: TraceLevel) -> bool { level <= self }
}

/// Tunables for an [`Engine`](crate::engine::Engine).
///
/// # Default Values
/// - `trace_level`: [`TraceLevel::Event`]
/// - `command_timeout`: 2 seconds
/// - `max_routing_table_size`: 0 (unset)
/// - `max_connections`: 4
/// - `max_reassembly_size`: 1024 bytes
/// - `reassembly_enabled`: true
/// - `deactivate_wait`: 1 second
/// - `credit_wait`: disabled
/// - `recovery_enabled`: true
/// - `mailbox_capacity`: 64
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NciConfig {
    /// Initial protocol trace level.
    pub trace_level: TraceLevel,
    /// How long to wait for the response to an outstanding command.
    pub command_timeout: Duration,
    /// Routing table capacity; a non-zero value from CORE_INIT replaces it.
    pub max_routing_table_size: u16,
    /// Control blocks available, including the RF connection.
    pub max_connections: usize,
    /// Largest buffer an inbound reassembly may grow to.
    pub max_reassembly_size: usize,
    /// Deliver RF-connection data only once all segments have arrived.
    pub reassembly_enabled: bool,
    /// How long a deferred deactivate waits for outstanding credits.
    pub deactivate_wait: Duration,
    /// When set, an RF send left without credits for this long triggers
    /// recovery.
    pub credit_wait: Option<Duration>,
    /// Rebuild controller state on command timeout instead of failing.
    pub recovery_enabled: bool,
    /// Capacity of the runtime mailbox.
    pub mailbox_capacity: usize,
}

impl Default for NciConfig {
    fn default() -> Self {
        Self {
            trace_level: TraceLevel::default(),
            command_timeout: Duration::from_secs(2),
            max_routing_table_size: 0,
            max_connections: 4,
            max_reassembly_size: 1024,
            reassembly_enabled: true,
            deactivate_wait: Duration::from_secs(1),
            credit_wait: None,
            recovery_enabled: true,
            mailbox_capacity: 64,
        }
    }
}

impl NciConfig {
    /// Clamp values to usable bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use ncilink::config::NciConfig;
    ///
    /// let cfg = NciConfig {
    ///     command_timeout: Duration::ZERO,
    ///     max_connections: 0,
    ///     ..NciConfig::default()
    /// };
    ///
    /// let normalized = cfg.normalized();
    /// assert_eq!(normalized.command_timeout, Duration::from_millis(10));
    /// assert_eq!(normalized.max_connections, 1);
    /// ```
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.command_timeout = self.command_timeout.max(MIN_COMMAND_TIMEOUT);
        self.max_connections = self.max_connections.clamp(1, MAX_CONNECTIONS);
        self.max_reassembly_size = self.max_reassembly_size.max(crate::codec::MAX_PAYLOAD_LEN);
        self.mailbox_capacity = self.mailbox_capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{NciConfig, TraceLevel};

    #[test]
    fn normalized_keeps_defaults() {
        assert_eq!(NciConfig::default().normalized(), NciConfig::default());
    }

    #[test]
    fn normalized_raises_reassembly_to_one_packet() {
        let cfg = NciConfig {
            max_reassembly_size: 4,
            ..NciConfig::default()
        }
        .normalized();
        assert_eq!(cfg.max_reassembly_size, 255);
    }

    #[test]
    fn trace_levels_nest() {
        assert!(TraceLevel::Debug.allows(TraceLevel::Event));
        assert!(!TraceLevel::Warning.allows(TraceLevel::Api));
        assert_eq!(TraceLevel::None.level_filter(), log::LevelFilter::Off);
    }

    #[test]
    fn command_timeout_is_clamped() {
        let cfg = NciConfig {
            command_timeout: Duration::from_millis(1),
            ..NciConfig::default()
        }
        .normalized();
        assert_eq!(cfg.command_timeout, Duration::from_millis(10));
    }
}
