//! Protocol state of the engine.

/// Exactly one of these holds at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NfcState {
    /// Transport closed, nothing initialised.
    Uninitialized,
    /// Waiting for the transport to report open-complete.
    AwaitingTransportOpen,
    /// CORE_RESET/CORE_INIT in progress.
    CoreInit,
    /// Waiting for the transport's chip-specific post-init step.
    AwaitingPostInit,
    /// Ready; no RF link.
    Idle,
    /// An RF interface is active.
    Open,
    /// Waiting to deactivate the RF link.
    Closing,
    /// Waiting for the transport to report close-complete.
    AwaitingTransportClose,
    /// Controller parked in power-off sleep.
    PowerOffSleep,
}

impl NfcState {
    /// Canonical trace name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "NONE",
            Self::AwaitingTransportOpen => "W4_HAL_OPEN",
            Self::CoreInit => "CORE_INIT",
            Self::AwaitingPostInit => "W4_POST_INIT_CPLT",
            Self::Idle => "IDLE",
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
            Self::AwaitingTransportClose => "W4_HAL_CLOSE",
            Self::PowerOffSleep => "NFCC_POWER_OFF_SLEEP",
        }
    }

    /// Whether enabling has completed (idle or beyond, short of closing the
    /// transport).
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Idle | Self::Open | Self::Closing)
    }
}

impl std::fmt::Display for NfcState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

/// Secondary conditions that qualify the current [`NfcState`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateFlags {
    /// A deactivate is deferred until outstanding credits return.
    pub deactivating: bool,
    /// The transport asked for control of the channel.
    pub control_requested: bool,
    /// A discovery start is waiting for the window.
    pub discover_pending: bool,
    /// The transport itself asked for the channel, rather than for a
    /// pre-discovery sequence.
    pub hal_requested: bool,
    /// The transport currently owns the channel.
    pub transport_has_control: bool,
    /// Leaving power-off sleep; report the outcome as a restart.
    pub restarting: bool,
    /// Closing the transport to enter power-off sleep.
    pub entering_sleep: bool,
    /// Power cycle in progress; report the outcome as a restart.
    pub power_cycling: bool,
}

#[cfg(test)]
mod tests {
    use super::NfcState;

    #[test]
    fn states_order_along_the_enable_path() {
        assert!(NfcState::Uninitialized < NfcState::CoreInit);
        assert!(NfcState::AwaitingPostInit < NfcState::Idle);
        assert!(NfcState::Idle.is_enabled());
        assert!(!NfcState::AwaitingTransportClose.is_enabled());
    }

    #[test]
    fn trace_names_match_wire_logs() {
        assert_eq!(NfcState::PowerOffSleep.to_string(), "NFCC_POWER_OFF_SLEEP");
        assert_eq!(NfcState::AwaitingTransportOpen.name(), "W4_HAL_OPEN");
    }
}
