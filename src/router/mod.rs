//! Dispatch of inbound packets.
//!
//! Packets are routed by message type and group, then by opcode. A response
//! is accepted only if it answers the command in flight; the slot it held is
//! given back here and nowhere else, before the group handler runs. Handlers
//! report malformed payloads as [`FrameError`]s which are logged and counted,
//! never propagated.

mod core;
mod ee;
mod rf;
mod vendor;

use log::{debug, error, warn};

use crate::{
    codec::{ControlFrame, Frame, FrameError, Gid, MessageType, opcode},
    command::HeaderSnapshot,
    config::TraceLevel,
    engine::{Engine, Hex},
    event::VendorEvent,
    metrics::{self, Direction},
    state::NfcState,
    timer::TimerKind,
    transport::Transport,
};

impl<T: Transport> Engine<T> {
    /// Feed bytes received from the transport.
    ///
    /// `buf` normally holds one packet; several back-to-back packets are
    /// accepted too. Decoding stops at the first malformed packet.
    pub fn on_bytes(&mut self, buf: &[u8]) {
        let mut rest = buf;
        while !rest.is_empty() {
            match Frame::decode_prefix(rest) {
                Ok((frame, used)) => {
                    if self.trace_level.allows(TraceLevel::Debug) {
                        debug!("rx: {}", Hex(&rest[..used]));
                    }
                    rest = &rest[used..];
                    self.dispatch(frame);
                }
                Err(err) => {
                    warn!("dropping inbound packet ({}): {err}", err.error_type());
                    metrics::inc_protocol_errors();
                    return;
                }
            }
        }
    }

    fn dispatch(&mut self, frame: Frame) {
        metrics::inc_frames(Direction::Inbound, frame.message_type());
        match frame {
            Frame::Response(rsp) => self.on_response(rsp),
            Frame::Notification(ntf) => self.on_notification(ntf),
            Frame::Data(data) => self.on_data(data),
            Frame::Command(cmd) => {
                warn!("controller sent a command ({}); dropped", cmd.name());
                metrics::inc_protocol_errors();
            }
        }
    }

    fn on_response(&mut self, rsp: ControlFrame) {
        if rsp.gid == Gid::PROPRIETARY
            && let Some(pending) = self.channel.take_vendor()
        {
            debug!("proprietary response {:#04x} for pending request {:#04x}", rsp.oid, pending.oid());
            self.release_window();
            pending.complete(VendorEvent {
                mt: MessageType::Response.bits(),
                oid: rsp.oid,
                payload: rsp.payload,
            });
            self.check_cmd_queue();
            return;
        }

        let snapshot = self.channel.last_sent().cloned();
        let matched = snapshot
            .as_ref()
            .is_some_and(|last| last.is_answered_by(rsp.gid, rsp.oid));
        if !matched {
            let discovery_race = rsp.gid == Gid::RF_MANAGE
                && rsp.oid == opcode::rf::DISCOVER
                && self.channel.window() == 0
                && !self.flags.transport_has_control;
            if !discovery_race {
                let expected = snapshot
                    .as_ref()
                    .map_or("nothing", |last| opcode::name(last.gid(), last.oid()));
                error!("unexpected response {} while {expected} is outstanding", rsp.name());
                metrics::inc_protocol_errors();
                return;
            }
            warn!("RF_DISCOVER response overtook the command in flight; reopening the window");
        }

        self.release_window();
        let result = match rsp.gid {
            Gid::CORE => self.core_response(rsp.oid, &rsp.payload, snapshot.as_ref()),
            Gid::RF_MANAGE => self.rf_response(rsp.oid, &rsp.payload, snapshot.as_ref()),
            Gid::EE_MANAGE => self.ee_response(rsp.oid, &rsp.payload, snapshot.as_ref()),
            Gid::PROPRIETARY => {
                self.vendor_broadcast(MessageType::Response, rsp.oid, &rsp.payload);
                Ok(())
            }
            gid => {
                warn!("response in unknown group {gid}");
                Ok(())
            }
        };
        log_malformed(&rsp, result);
        self.check_cmd_queue();
    }

    fn on_notification(&mut self, ntf: ControlFrame) {
        let result = match ntf.gid {
            Gid::CORE => self.core_notification(ntf.oid, &ntf.payload),
            Gid::RF_MANAGE => self.rf_notification(ntf.oid, &ntf.payload),
            Gid::EE_MANAGE => self.ee_notification(ntf.oid, &ntf.payload),
            Gid::PROPRIETARY => {
                self.vendor_broadcast(MessageType::Notification, ntf.oid, &ntf.payload);
                Ok(())
            }
            gid => {
                warn!("notification in unknown group {gid}");
                Ok(())
            }
        };
        log_malformed(&ntf, result);
    }

    /// Give back the window slot held by the answered command.
    fn release_window(&mut self) {
        self.timers.stop(TimerKind::CommandResponse);
        if !self.channel.release() && self.state != NfcState::AwaitingTransportClose {
            warn!("response arrived with the command window already open");
            metrics::inc_protocol_errors();
        }
    }
}

fn log_malformed(frame: &ControlFrame, result: Result<(), FrameError>) {
    if let Err(err) = result {
        warn!("malformed {}: {err}", frame.name());
        metrics::inc_protocol_errors();
    }
}

fn unknown_opcode(kind: &str, gid: Gid, oid: u8) {
    warn!("unknown {kind} opcode {oid:#04x} in group {gid}");
}

/// Snapshot payload byte, or zero if the command carried none.
fn snapshot_byte(snapshot: Option<&HeaderSnapshot>, index: usize) -> u8 {
    snapshot.and_then(|last| last.payload_byte(index)).unwrap_or_default()
}
