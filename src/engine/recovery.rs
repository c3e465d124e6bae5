//! Timer expiry and command-timeout recovery.
//!
//! A command left unanswered is treated as a wedged channel. Recovery runs
//! once: it drops everything queued, talks to the controller through
//! [`Transport::transceive`] (the window is bypassed), and either returns the
//! engine to idle with the window open or fails the session for good.

use bytes::Bytes;
use log::{debug, error, info, warn};
use tokio::time::Instant;

use super::{Engine, lifecycle::RESET_KEEP_CONFIG};
use crate::{
    codec::{self, Frame, Gid, MessageType, opcode::core},
    conn::ConnId,
    error::{NciError, Result},
    event::{ConnEvent, DeactivateType, Deactivation, DiscoverEvent, ResponseEvent, VendorEvent},
    metrics,
    state::NfcState,
    status::Status,
    timer::TimerKind,
    transport::Transport,
};

impl<T: Transport> Engine<T> {
    /// Fire every timer whose deadline is at or before `now`.
    pub fn on_tick(&mut self, now: Instant) {
        for kind in self.timers.pop_expired(now) {
            self.on_timer(kind);
        }
        for kind in self.quick_timers.pop_expired(now) {
            self.on_timer(kind);
        }
    }

    fn on_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::CommandResponse => self.on_command_timeout(),
            TimerKind::DeactivateWait => {
                warn!("credits did not return in time; deactivating anyway");
                self.flags.deactivating = false;
                if let Some(kind) = self.deferred_deactivate.take()
                    && let Err(err) = self.send_deactivate(kind)
                {
                    error!("failed to queue the deferred deactivate: {err}");
                }
            }
            TimerKind::CreditWait => {
                warn!("RF connection starved of credits");
                self.on_channel_stall();
            }
            TimerKind::Quick(id) => self.respond(ResponseEvent::QuickTimer(id)),
        }
    }

    fn on_command_timeout(&mut self) {
        metrics::inc_command_timeouts();
        let last = self
            .channel
            .last_sent()
            .map_or("none", |last| codec::opcode::name(last.gid(), last.oid()));
        error!("command timeout in state {} (last sent {last})", self.state);
        self.on_channel_stall();
    }

    fn on_channel_stall(&mut self) {
        if self.state < NfcState::Idle {
            self.respond(ResponseEvent::NfccTimeout(Status::HW_TIMEOUT));
            self.enable_failed();
            return;
        }
        if !self.state.is_enabled() {
            return;
        }
        if !self.config.recovery_enabled {
            self.respond(ResponseEvent::GenericError(Status::HW_TIMEOUT));
            self.respond(ResponseEvent::NfccTimeout(Status::HW_TIMEOUT));
            self.fail_session();
            return;
        }
        self.recover();
    }

    /// Rebuild controller state after a timeout.
    fn recover(&mut self) {
        let rediscover = self.channel.last_discovery().cloned();
        let was_active = matches!(self.state, NfcState::Open | NfcState::Closing);
        self.timers.clear();
        self.flags.deactivating = false;
        self.flags.control_requested = false;
        self.flags.discover_pending = false;
        self.flags.hal_requested = false;
        self.flags.transport_has_control = false;
        self.deferred_deactivate = None;
        self.abandon_vendor_request(Status::HW_TIMEOUT);
        let dropped = self.channel.reset();
        self.drop_logical_conns();
        info!("recovering: {dropped} queued commands discarded");

        match self.reinitialise() {
            Ok(()) => {
                metrics::inc_recoveries(true);
                self.set_state(NfcState::Idle);
                if was_active {
                    self.report_link_reset();
                }
                if let Some(packet) = rediscover {
                    self.channel.set_pending_discovery(packet);
                    self.send_pending_discovery();
                }
                self.respond(ResponseEvent::Recovered);
            }
            Err(err) => {
                metrics::inc_recoveries(false);
                error!("recovery failed: {err}");
                self.respond(ResponseEvent::NfccTimeout(Status::HW_TIMEOUT));
                self.fail_session();
            }
        }
    }

    /// Complete a proprietary request whose response will never arrive.
    pub(crate) fn abandon_vendor_request(&mut self, status: Status) {
        if let Some(pending) = self.channel.take_vendor() {
            let oid = pending.oid();
            warn!("abandoning proprietary request {oid:#04x}");
            pending.complete(VendorEvent {
                mt: MessageType::Response.bits(),
                oid,
                payload: Bytes::copy_from_slice(&[status.get()]),
            });
        }
    }

    /// Free every logical connection the reset wiped from the controller.
    ///
    /// Only the static RF block survives, with its queues flushed.
    fn drop_logical_conns(&mut self) {
        for handle in self.conns.handles() {
            let is_rf = self
                .conns
                .get(handle)
                .is_some_and(|block| block.id() == ConnId::RF);
            if is_rf {
                if let Some(rf) = self.conns.get_mut(handle) {
                    rf.flush();
                }
                continue;
            }
            let Some(block) = self.conns.free(handle) else {
                continue;
            };
            debug!("recovery released {}", block.id());
            if block.id() == ConnId::PENDING {
                block.notify(ConnEvent::Created {
                    status: Status::HW_TIMEOUT,
                    max_payload: 0,
                    credits: 0,
                });
            } else {
                block.notify(ConnEvent::Closed {
                    status: Status::HW_TIMEOUT,
                });
            }
        }
    }

    /// Reset and initialise the controller over the raw path.
    fn reinitialise(&mut self) -> Result<()> {
        self.raw_exchange(core::RESET, Bytes::from_static(&[RESET_KEEP_CONFIG]))?;
        self.raw_exchange(core::INIT, Bytes::new())
    }

    fn raw_exchange(&mut self, oid: u8, payload: Bytes) -> Result<()> {
        let packet = codec::command(Gid::CORE, oid, payload)?;
        let reply = self.transport.transceive(&packet)?;
        let (frame, _) = Frame::decode_prefix(&reply)?;
        match frame {
            Frame::Response(rsp) if rsp.gid == Gid::CORE && rsp.oid == oid => {
                match rsp.payload.first().copied().map(Status::new) {
                    Some(Status::OK) => Ok(()),
                    _ => Err(NciError::Failed("controller rejected recovery")),
                }
            }
            _ => Err(NciError::Failed("unexpected recovery reply")),
        }
    }

    /// The RF link did not survive the reset.
    fn report_link_reset(&mut self) {
        let deactivation = Deactivation {
            status: Status::HW_TIMEOUT,
            kind: DeactivateType::Idle,
            is_ntf: true,
        };
        if let Some(rf) = self.conns.by_id_mut(ConnId::RF) {
            rf.configure(0, 0);
            rf.notify(ConnEvent::Deactivated(deactivation));
        }
        self.discover(DiscoverEvent::Deactivated(deactivation));
    }

    /// Tear down after an unrecoverable timeout; reported as a failed enable.
    fn fail_session(&mut self) {
        self.gen_cleanup();
        self.timers.clear();
        self.quick_timers.clear();
        self.set_state(NfcState::Uninitialized);
        if let Err(err) = self.transport.close() {
            warn!("transport close after failure: {err}");
        }
        self.respond(ResponseEvent::Enabled {
            status: Status::FAILED,
            capabilities: None,
        });
    }
}
