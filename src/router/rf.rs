//! RF management responses and notifications.

use bytes::Bytes;
use log::{debug, info};

use super::{snapshot_byte, unknown_opcode};
use crate::{
    codec::{FrameError, Gid, Reader, opcode::rf},
    command::HeaderSnapshot,
    conn::ConnId,
    engine::Engine,
    event::{
        Activation, ConnEvent, DeactivateType, Deactivation, DiscoverEvent, ResponseEvent,
        RfTechParams,
    },
    state::NfcState,
    status::Status,
    timer::TimerKind,
    transport::Transport,
};

/// RF_DISCOVER notification type announcing further results.
const MORE_RESULTS: u8 = 2;

impl<T: Transport> Engine<T> {
    pub(super) fn rf_response(
        &mut self,
        oid: u8,
        payload: &[u8],
        snapshot: Option<&HeaderSnapshot>,
    ) -> Result<(), FrameError> {
        let mut reader = Reader::new(payload);
        let status = Status::new(reader.u8("status")?);
        match oid {
            rf::DISCOVER_MAP => self.discover(DiscoverEvent::Map(status)),
            rf::DISCOVER => self.discover(DiscoverEvent::Started(status)),
            rf::DISCOVER_SELECT => self.discover(DiscoverEvent::Select(status)),
            rf::DEACTIVATE => {
                let kind = DeactivateType::from_u8(snapshot_byte(snapshot, 0));
                self.proc_deactivate(status, kind, false);
            }
            rf::SET_ROUTING => self.respond(ResponseEvent::SetRouting(status)),
            rf::GET_ROUTING => {
                // A successful response is followed by the table notifications.
                if !status.is_ok() {
                    self.respond(ResponseEvent::GetRouting {
                        status,
                        tlvs: Bytes::new(),
                    });
                }
            }
            rf::PARAMETER_UPDATE => {
                let failed_ids = if reader.is_empty() {
                    Bytes::new()
                } else {
                    reader.u8("num_params")?;
                    Bytes::copy_from_slice(reader.rest())
                };
                self.respond(ResponseEvent::RfParamUpdate { status, failed_ids });
            }
            rf::T3T_POLLING => {
                if !status.is_ok() {
                    self.discover(DiscoverEvent::T3tPolling {
                        status,
                        count: 0,
                        responses: Bytes::new(),
                    });
                }
            }
            oid => unknown_opcode("response", Gid::RF_MANAGE, oid),
        }
        Ok(())
    }

    pub(super) fn rf_notification(&mut self, oid: u8, payload: &[u8]) -> Result<(), FrameError> {
        let mut reader = Reader::new(payload);
        match oid {
            rf::DISCOVER => {
                let rf_disc_id = reader.u8("rf_disc_id")?;
                let protocol = reader.u8("protocol")?;
                let mode = reader.u8("mode")?;
                let params = Bytes::copy_from_slice(reader.length_prefixed("tech_params")?);
                let more = reader.u8("notification_type")? == MORE_RESULTS;
                self.discover(DiscoverEvent::Result {
                    rf_disc_id,
                    protocol,
                    tech: RfTechParams { mode, params },
                    more,
                });
            }
            rf::INTF_ACTIVATED => {
                let activation = parse_activation(&mut reader)?;
                self.on_activated(activation);
            }
            rf::DEACTIVATE => {
                let kind = DeactivateType::from_u8(reader.u8("deactivation_type")?);
                self.proc_deactivate(Status::OK, kind, true);
            }
            rf::FIELD => {
                let on = reader.u8("field_status")? != 0;
                self.respond(ResponseEvent::RfField { on });
            }
            rf::T3T_POLLING => {
                let status = Status::new(reader.u8("status")?);
                let count = reader.u8("num_responses")?;
                let responses = Bytes::copy_from_slice(reader.rest());
                self.discover(DiscoverEvent::T3tPolling {
                    status,
                    count,
                    responses,
                });
            }
            rf::GET_ROUTING => {
                let more = reader.u8("more")? != 0;
                let _count = reader.u8("num_entries")?;
                let tlvs = Bytes::copy_from_slice(reader.rest());
                let status = if more { Status::CONTINUE } else { Status::OK };
                self.respond(ResponseEvent::GetRouting { status, tlvs });
            }
            rf::EE_ACTION => self.respond(ResponseEvent::EeAction(Bytes::copy_from_slice(payload))),
            rf::EE_DISCOVERY_REQ => {
                self.respond(ResponseEvent::EeDiscoveryRequest(Bytes::copy_from_slice(payload)));
            }
            oid => unknown_opcode("notification", Gid::RF_MANAGE, oid),
        }
        Ok(())
    }

    fn on_activated(&mut self, activation: Activation) {
        info!(
            "RF interface {:#04x} activated (protocol {:#04x}, {} credits)",
            activation.interface, activation.protocol, activation.credits
        );
        self.set_state(NfcState::Open);
        if self.conns.find_by_id(ConnId::RF).is_none() {
            self.conns.bind_rf(self.rf_callback.clone());
        }
        if let Some(block) = self.conns.by_id_mut(ConnId::RF) {
            block.configure(activation.max_payload, activation.credits);
            block.protocol = activation.protocol;
            block.interface = activation.interface;
        }
        self.discover(DiscoverEvent::Activated(activation));
    }

    /// Finish an RF deactivation reported by response or notification.
    pub(crate) fn proc_deactivate(&mut self, status: Status, kind: DeactivateType, is_ntf: bool) {
        debug!("RF deactivated ({kind:?}, status {status}, notification {is_ntf})");
        self.set_state(NfcState::Idle);
        self.flags.deactivating = false;
        self.deferred_deactivate = None;
        self.timers.stop(TimerKind::DeactivateWait);
        self.timers.stop(TimerKind::CreditWait);
        let deactivation = Deactivation {
            status,
            kind,
            is_ntf,
        };
        if let Some(rf) = self.conns.by_id_mut(ConnId::RF) {
            rf.flush();
            rf.notify(ConnEvent::Deactivated(deactivation));
        }
        if kind == DeactivateType::Idle {
            self.channel.clear_last_discovery();
        }
        self.discover(DiscoverEvent::Deactivated(deactivation));
    }
}

fn parse_activation(reader: &mut Reader<'_>) -> Result<Activation, FrameError> {
    let rf_disc_id = reader.u8("rf_disc_id")?;
    let interface = reader.u8("interface")?;
    let protocol = reader.u8("protocol")?;
    let mode = reader.u8("mode")?;
    let max_payload = reader.u8("max_payload")?;
    let credits = reader.u8("initial_credits")?;
    let params = Bytes::copy_from_slice(reader.length_prefixed("tech_params")?);
    let data_mode = reader.u8("data_mode")?;
    let tx_bitrate = reader.u8("tx_bitrate")?;
    let rx_bitrate = reader.u8("rx_bitrate")?;
    let activation_params = if reader.is_empty() {
        Bytes::new()
    } else {
        Bytes::copy_from_slice(reader.length_prefixed("activation_params")?)
    };
    Ok(Activation {
        rf_disc_id,
        interface,
        protocol,
        mode,
        max_payload,
        credits,
        tech: RfTechParams { mode, params },
        data_mode,
        tx_bitrate,
        rx_bitrate,
        activation_params,
    })
}

#[cfg(test)]
mod tests {
    use super::parse_activation;
    use crate::codec::{FrameError, Reader};

    #[test]
    fn activation_without_interface_parameters() {
        let payload = [0x01, 0x02, 0x04, 0x00, 0xFD, 0x01, 0x02, 0x44, 0x00, 0x00, 0x01, 0x01];
        let activation = parse_activation(&mut Reader::new(&payload)).expect("parse");
        assert_eq!(activation.rf_disc_id, 1);
        assert_eq!(activation.interface, 2);
        assert_eq!(activation.protocol, 4);
        assert_eq!(activation.max_payload, 0xFD);
        assert_eq!(activation.credits, 1);
        assert_eq!(activation.tech.params.as_ref(), &[0x44, 0x00]);
        assert_eq!((activation.tx_bitrate, activation.rx_bitrate), (1, 1));
        assert!(activation.activation_params.is_empty());
    }

    #[test]
    fn activation_keeps_interface_parameters() {
        let payload = [
            0x01, 0x02, 0x04, 0x00, 0xFD, 0x01, 0x00, 0x00, 0x00, 0x00, 0x02, 0x78, 0x80,
        ];
        let activation = parse_activation(&mut Reader::new(&payload)).expect("parse");
        assert!(activation.tech.params.is_empty());
        assert_eq!(activation.activation_params.as_ref(), &[0x78, 0x80]);
    }

    #[test]
    fn truncated_technology_parameters_are_rejected() {
        let payload = [0x01, 0x02, 0x04, 0x00, 0xFD, 0x01, 0x05, 0x44];
        let err = parse_activation(&mut Reader::new(&payload)).expect_err("truncated");
        assert!(matches!(err, FrameError::FieldOverrun { field: "tech_params", .. }));
    }
}
