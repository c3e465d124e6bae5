//! Enable, disable and power sequencing, and transport lifecycle events.

use log::{debug, error, info, warn};

use super::Engine;
use crate::{
    codec::{Gid, opcode::core},
    error::{NciError, Result},
    event::{ConnEvent, DeactivateType, Deactivation, NfccCapabilities, ResponseEvent},
    params::DEFAULT_DISCOVER_MAPS,
    state::NfcState,
    status::Status,
    timer::TimerKind,
    transport::{HalError, HalEvent, Transport},
};

/// CORE_RESET type asking the controller to drop its configuration.
pub(crate) const RESET_CONFIG: u8 = 0x01;
/// CORE_RESET type keeping the configuration the controller already holds.
pub(crate) const RESET_KEEP_CONFIG: u8 = 0x00;
/// Oldest NCI version the engine talks to.
const MIN_NCI_VERSION: u8 = 0x0F;

impl<T: Transport> Engine<T> {
    /// Open the transport and bring the controller up.
    ///
    /// Completion is reported as [`ResponseEvent::Enabled`].
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] unless the engine is
    /// uninitialised, or [`NciError::Transport`] if the open could not be
    /// issued.
    pub fn enable(&mut self) -> Result<()> {
        self.api_trace("enable");
        if self.state != NfcState::Uninitialized {
            return Err(NciError::NotInitialized(self.state));
        }
        self.flags = crate::state::StateFlags::default();
        self.begin_open()
    }

    fn begin_open(&mut self) -> Result<()> {
        self.set_state(NfcState::AwaitingTransportOpen);
        if let Err(err) = self.transport.open() {
            error!("transport open failed: {err}");
            self.set_state(NfcState::Uninitialized);
            return Err(err.into());
        }
        Ok(())
    }

    /// Shut the controller down and close the transport.
    ///
    /// Completion is reported exactly once as [`ResponseEvent::Disabled`].
    ///
    /// # Errors
    ///
    /// This call currently always succeeds; transport failures while closing
    /// are reported through the completion event.
    pub fn disable(&mut self) -> Result<()> {
        self.api_trace("disable");
        self.flags.entering_sleep = false;
        self.flags.power_cycling = false;
        if matches!(self.state, NfcState::Uninitialized | NfcState::PowerOffSleep) {
            self.set_state(NfcState::Uninitialized);
            self.respond(ResponseEvent::Disabled);
            return Ok(());
        }
        self.shutdown_nfcc();
        Ok(())
    }

    /// Enter (`true`) or leave (`false`) power-off sleep.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] unless the engine is idle
    /// (entering) or asleep (leaving), or [`NciError::Transport`] if the
    /// reopen could not be issued.
    pub fn set_power_off_sleep(&mut self, enter: bool) -> Result<()> {
        self.api_trace("set_power_off_sleep");
        match (enter, self.state) {
            (true, NfcState::Idle) => {
                self.flags.entering_sleep = true;
                self.shutdown_nfcc();
                Ok(())
            }
            (false, NfcState::PowerOffSleep) => {
                self.flags.restarting = true;
                self.begin_open()
            }
            (_, state) => Err(NciError::NotInitialized(state)),
        }
    }

    /// Power-cycle the controller and run the reset/init sequence again.
    ///
    /// Completion is reported as [`ResponseEvent::NfccRestart`].
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] unless the engine is idle.
    pub fn power_cycle(&mut self) -> Result<()> {
        self.api_trace("power_cycle");
        if self.state != NfcState::Idle {
            return Err(NciError::NotInitialized(self.state));
        }
        self.flags.power_cycling = true;
        self.shutdown_nfcc();
        Ok(())
    }

    fn shutdown_nfcc(&mut self) {
        self.gen_cleanup();
        if self.flags.entering_sleep {
            self.set_state(NfcState::AwaitingTransportClose);
            self.close_transport();
        } else if self.flags.power_cycling {
            self.set_state(NfcState::AwaitingTransportOpen);
            if let Err(err) = self.transport.power_cycle() {
                error!("transport power cycle failed: {err}");
                self.enable_failed();
            }
        } else {
            self.set_state(NfcState::AwaitingTransportClose);
            self.close_transport();
            self.timers.clear();
            self.quick_timers.clear();
        }
    }

    pub(crate) fn close_transport(&mut self) {
        if let Err(err) = self.transport.close() {
            error!("transport close failed: {err}");
            self.on_close_complete(Status::FAILED);
        }
    }

    /// Drop every queued command, connection and flag so nothing survives
    /// into the next session.
    pub(crate) fn gen_cleanup(&mut self) {
        self.flags.deactivating = false;
        self.flags.control_requested = false;
        self.flags.discover_pending = false;
        self.flags.hal_requested = false;
        self.flags.transport_has_control = false;
        self.deferred_deactivate = None;
        self.timers.stop(TimerKind::CommandResponse);
        self.timers.stop(TimerKind::DeactivateWait);
        self.timers.stop(TimerKind::CreditWait);
        self.reset_all_conns();
        self.abandon_vendor_request(Status::NOT_INITIALIZED);
        let dropped = self.channel.reset();
        if dropped > 0 {
            debug!("discarded {dropped} queued commands");
        }
    }

    /// Free every control block, telling each owner the link is gone.
    pub(crate) fn reset_all_conns(&mut self) {
        let gone = ConnEvent::Deactivated(Deactivation {
            status: Status::NOT_INITIALIZED,
            kind: DeactivateType::Idle,
            is_ntf: true,
        });
        for handle in self.conns.handles() {
            if let Some(block) = self.conns.free(handle)
                && block.id().is_assignable()
            {
                block.notify(gone.clone());
            }
        }
    }

    /// Feed a lifecycle notification from the transport.
    pub fn on_hal_event(&mut self, event: HalEvent) {
        debug!("transport event {event:?} in state {}", self.state);
        match event {
            HalEvent::OpenComplete(status) => self.on_open_complete(status),
            HalEvent::CloseComplete(status) => self.on_close_complete(status),
            HalEvent::PostInitComplete(status) => self.on_post_init_complete(status),
            HalEvent::PreDiscoverComplete(_) => {
                self.channel.reclaim();
                self.flags.transport_has_control = false;
                if self.flags.discover_pending {
                    self.flags.discover_pending = false;
                    self.send_pending_discovery();
                } else {
                    self.check_cmd_queue();
                }
            }
            HalEvent::RequestControl => {
                self.flags.control_requested = true;
                self.flags.hal_requested = true;
                self.check_cmd_queue();
            }
            HalEvent::ReleaseControl(status) => {
                if self.flags.transport_has_control {
                    self.flags.transport_has_control = false;
                    self.channel.reclaim();
                    self.check_cmd_queue();
                }
                if status == Status::HW_TIMEOUT {
                    self.respond(ResponseEvent::NfccTimeout(Status::HW_TIMEOUT));
                }
            }
            HalEvent::Error(kind) => self.on_transport_error(kind),
        }
    }

    fn on_open_complete(&mut self, status: Status) {
        if self.state != NfcState::AwaitingTransportOpen {
            warn!("open complete ignored in state {}", self.state);
            return;
        }
        if !status.is_ok() {
            error!("transport open failed with {status}");
            self.enable_failed();
            return;
        }
        self.set_state(NfcState::CoreInit);
        if let Err(err) = self.send_command(Gid::CORE, core::RESET, vec![RESET_CONFIG]) {
            error!("failed to queue CORE_RESET: {err}");
            self.enable_failed();
        }
    }

    fn on_close_complete(&mut self, status: Status) {
        match self.state {
            NfcState::AwaitingTransportClose if self.flags.entering_sleep => {
                self.flags.entering_sleep = false;
                self.set_state(NfcState::PowerOffSleep);
                self.respond(ResponseEvent::PowerOffSleep { status });
            }
            NfcState::AwaitingTransportClose => {
                self.set_state(NfcState::Uninitialized);
                self.respond(ResponseEvent::Disabled);
            }
            NfcState::Uninitialized | NfcState::PowerOffSleep => {
                debug!("close complete after shutdown already finished");
            }
            _ => {
                self.set_state(NfcState::Uninitialized);
                self.report_enable(Status::FAILED, None);
            }
        }
    }

    fn on_post_init_complete(&mut self, status: Status) {
        if self.state != NfcState::AwaitingPostInit {
            warn!("post-init complete ignored in state {}", self.state);
            return;
        }
        self.init_rsp = None;
        if status.is_ok() {
            self.nfc_enabled();
        } else {
            error!("post-init failed with {status}");
            self.enable_failed();
        }
    }

    fn on_transport_error(&mut self, kind: HalError) {
        match kind {
            HalError::CommandTimeout => {
                self.respond(ResponseEvent::NfccTimeout(Status::HW_TIMEOUT));
                if self.state < NfcState::Idle {
                    self.enable_failed();
                }
            }
            HalError::Transport if self.state < NfcState::Idle => {
                error!("transport failed while enabling");
                self.enable_failed();
            }
            HalError::Transport => {
                error!("transport failed in state {}", self.state);
                self.respond(ResponseEvent::LinkLoss);
                if self.state.is_enabled() {
                    self.flags.entering_sleep = false;
                    self.flags.power_cycling = false;
                    self.shutdown_nfcc();
                }
            }
        }
    }

    /// Enabling finished: bind the RF connection, go idle and issue the
    /// default discovery map.
    fn nfc_enabled(&mut self) {
        self.set_state(NfcState::Idle);
        let rf = self.conns.bind_rf(self.rf_callback.clone());
        if let Some(block) = self.conns.get_mut(rf) {
            block.configure(0, 0);
        }
        let maps: Vec<_> = DEFAULT_DISCOVER_MAPS
            .iter()
            .copied()
            .filter(|map| self.supports_interface(map.interface))
            .collect();
        if !maps.is_empty()
            && let Err(err) = self.send_discover_map(&maps)
        {
            warn!("failed to queue the default discovery map: {err}");
        }
        let capabilities = self.capabilities.clone();
        self.report_enable(Status::OK, capabilities);
    }

    /// Enabling failed somewhere between open and post-init.
    ///
    /// While the transport is open the failure is reported only once it has
    /// closed.
    pub(crate) fn enable_failed(&mut self) {
        self.init_rsp = None;
        if self.flags.restarting {
            self.gen_cleanup();
            self.set_state(NfcState::PowerOffSleep);
        } else {
            self.gen_cleanup();
            if matches!(self.state, NfcState::CoreInit | NfcState::AwaitingPostInit) {
                info!("closing the transport after a failed enable");
                self.close_transport();
                return;
            }
            self.set_state(NfcState::Uninitialized);
        }
        self.report_enable(Status::FAILED, None);
    }

    fn report_enable(&mut self, status: Status, capabilities: Option<NfccCapabilities>) {
        if self.flags.restarting || self.flags.power_cycling {
            self.flags.restarting = false;
            self.flags.power_cycling = false;
            self.respond(ResponseEvent::NfccRestart { status });
        } else {
            self.respond(ResponseEvent::Enabled {
                status,
                capabilities,
            });
        }
    }

    /// Handle a CORE_RESET response.
    pub(crate) fn on_reset_response(&mut self, status: Status, nci_version: u8, config_status: u8) {
        if self.state != NfcState::CoreInit {
            self.respond(ResponseEvent::Reset {
                status,
                nci_version,
                config_status,
            });
            return;
        }
        let status = if status.is_ok() && nci_version < MIN_NCI_VERSION {
            error!("unsupported NCI version {nci_version:#04x}");
            Status::FAILED
        } else {
            status
        };
        if !status.is_ok() {
            self.enable_failed();
            return;
        }
        self.nci_version = nci_version;
        if let Err(err) = self.send_command(Gid::CORE, core::INIT, bytes::Bytes::new()) {
            error!("failed to queue CORE_INIT: {err}");
            self.enable_failed();
        }
    }

    /// Handle a CORE_INIT response carrying parsed capabilities.
    pub(crate) fn on_init_response(&mut self, payload: &[u8], capabilities: Option<NfccCapabilities>) {
        if self.state != NfcState::CoreInit {
            warn!("CORE_INIT response ignored in state {}", self.state);
            return;
        }
        let Some(mut capabilities) = capabilities else {
            self.enable_failed();
            return;
        };
        capabilities.nci_version = self.nci_version;
        if capabilities.max_routing_table_size != 0 {
            self.max_routing_table_size = capabilities.max_routing_table_size;
        }
        self.capabilities = Some(capabilities);
        self.init_rsp = Some(bytes::Bytes::copy_from_slice(payload));
        self.set_state(NfcState::AwaitingPostInit);
        if let Err(err) = self.transport.core_initialized(payload) {
            error!("transport post-init could not start: {err}");
            self.enable_failed();
        }
    }
}
