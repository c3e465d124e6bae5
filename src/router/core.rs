//! CORE group responses and notifications.

use bytes::Bytes;
use log::{debug, warn};

use super::{snapshot_byte, unknown_opcode};
use crate::{
    codec::{FrameError, Gid, Reader, opcode::core},
    command::HeaderSnapshot,
    conn::ConnId,
    engine::Engine,
    event::{ConnEvent, DiscoverEvent, NfccCapabilities, ResponseEvent},
    state::NfcState,
    status::Status,
    transport::Transport,
};

impl<T: Transport> Engine<T> {
    pub(super) fn core_response(
        &mut self,
        oid: u8,
        payload: &[u8],
        snapshot: Option<&HeaderSnapshot>,
    ) -> Result<(), FrameError> {
        let mut reader = Reader::new(payload);
        match oid {
            core::RESET => {
                let status = Status::new(reader.u8("status")?);
                let (version, config_status) = if status.is_ok() {
                    (reader.u8("nci_version")?, reader.u8("config_status")?)
                } else {
                    (
                        reader.u8("nci_version").unwrap_or_default(),
                        reader.u8("config_status").unwrap_or_default(),
                    )
                };
                self.on_reset_response(status, version, config_status);
            }
            core::INIT => {
                let capabilities = match parse_capabilities(payload) {
                    Ok(caps) => caps,
                    Err(err) => {
                        warn!("CORE_INIT response unreadable: {err}");
                        None
                    }
                };
                self.on_init_response(payload, capabilities);
            }
            core::GET_CONFIG => {
                let status = Status::new(reader.u8("status")?);
                let tlvs = if reader.is_empty() {
                    Bytes::new()
                } else {
                    reader.u8("num_params")?;
                    Bytes::copy_from_slice(reader.rest())
                };
                self.respond(ResponseEvent::GetConfig { status, tlvs });
            }
            core::SET_CONFIG => {
                let status = Status::new(reader.u8("status")?);
                let failed_ids = if reader.is_empty() {
                    Bytes::new()
                } else {
                    reader.u8("num_params")?;
                    Bytes::copy_from_slice(reader.rest())
                };
                self.respond(ResponseEvent::SetConfig { status, failed_ids });
            }
            core::CONN_CREATE => self.on_conn_created(&mut reader, snapshot)?,
            core::CONN_CLOSE => {
                let status = Status::new(reader.u8("status")?);
                let id = ConnId::new(snapshot_byte(snapshot, 0));
                match self.conns.find_by_id(id).and_then(|handle| self.conns.free(handle)) {
                    Some(block) => block.notify(ConnEvent::Closed { status }),
                    None => warn!("close response for unknown {id}"),
                }
            }
            oid => unknown_opcode("response", Gid::CORE, oid),
        }
        Ok(())
    }

    fn on_conn_created(
        &mut self,
        reader: &mut Reader<'_>,
        snapshot: Option<&HeaderSnapshot>,
    ) -> Result<(), FrameError> {
        let Some(handle) = self.conns.find_pending() else {
            warn!("CORE_CONN_CREATE response without a pending connection");
            return Ok(());
        };
        debug!("connection created towards destination {:#04x}", snapshot_byte(snapshot, 0));
        let mut status = Status::new(reader.u8("status")?);
        if status.is_ok() {
            let max_payload = reader.u8("max_payload")?;
            let credits = reader.u8("initial_credits")?;
            let id = ConnId::new(reader.u8("conn_id")?);
            match self.conns.assign_id(handle, id) {
                Ok(()) => {
                    if let Some(block) = self.conns.get_mut(handle) {
                        block.configure(max_payload, credits);
                        block.notify(ConnEvent::Created {
                            status,
                            max_payload,
                            credits,
                        });
                    }
                    return Ok(());
                }
                Err(err) => {
                    warn!("controller assigned an unusable {id}: {err}");
                    status = Status::FAILED;
                }
            }
        }
        if let Some(block) = self.conns.free(handle) {
            block.notify(ConnEvent::Created {
                status,
                max_payload: 0,
                credits: 0,
            });
        }
        Ok(())
    }

    pub(super) fn core_notification(&mut self, oid: u8, payload: &[u8]) -> Result<(), FrameError> {
        let mut reader = Reader::new(payload);
        match oid {
            core::RESET => {
                if self.state == NfcState::CoreInit {
                    debug!("CORE_RESET notification during enabling ignored");
                    return Ok(());
                }
                let _reason = reader.u8("reason")?;
                let config_status = reader.u8("config_status")?;
                let nci_version = reader.u8("nci_version")?;
                self.respond(ResponseEvent::Reset {
                    status: Status::OK,
                    nci_version,
                    config_status,
                });
            }
            core::GENERIC_ERROR => {
                let status = Status::new(reader.u8("status")?);
                self.respond(ResponseEvent::GenericError(status));
                if status == Status::ACTIVATION_FAILED {
                    if let Some(rf) = self.conns.by_id_mut(ConnId::RF) {
                        rf.notify(ConnEvent::Error(status));
                    }
                    self.discover(DiscoverEvent::Error(status));
                }
            }
            core::INTERFACE_ERROR => {
                let status = Status::new(reader.u8("status")?);
                let id = ConnId::new(reader.u8("conn_id")?);
                match self.conns.by_id_mut(id) {
                    Some(block) => block.notify(ConnEvent::Error(status)),
                    None => warn!("interface error {status} on unknown {id}"),
                }
            }
            core::CONN_CREDITS => {
                let count = reader.u8("num_entries")?;
                for _ in 0..count {
                    let id = ConnId::new(reader.u8("conn_id")?);
                    let delta = reader.u8("credits")?;
                    self.on_credits(id, delta);
                }
            }
            oid => unknown_opcode("notification", Gid::CORE, oid),
        }
        Ok(())
    }
}

/// Parse a CORE_INIT response; `None` when the controller refused.
fn parse_capabilities(payload: &[u8]) -> Result<Option<NfccCapabilities>, FrameError> {
    let mut reader = Reader::new(payload);
    let status = Status::new(reader.u8("status")?);
    if !status.is_ok() {
        return Ok(None);
    }
    let features = reader.u32_le("features")?;
    let count = reader.u8("num_interfaces")?;
    let interfaces = reader.bytes("interfaces", usize::from(count))?.to_vec();
    Ok(Some(NfccCapabilities {
        nci_version: 0,
        features,
        interfaces,
        max_connections: reader.u8("max_connections")?,
        max_routing_table_size: reader.u16_le("max_routing_table_size")?,
        max_control_payload: reader.u8("max_control_payload")?,
        max_parameter_size: reader.u16_le("max_parameter_size")?,
        manufacturer_id: reader.u8("manufacturer_id")?,
        manufacturer_info: reader.array("manufacturer_info")?,
    }))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::parse_capabilities;
    use crate::codec::FrameError;

    const INIT_RSP: [u8; 17] = [
        0x00, 0x03, 0x00, 0x00, 0x00, 0x02, 0x01, 0x02, 0x01, 0x00, 0x02, 0xFF, 0x00, 0x01, 0x10,
        0xAA, 0xBB,
    ];

    #[test]
    fn parses_all_fields() {
        let mut payload = INIT_RSP.to_vec();
        payload.extend_from_slice(&[0xCC, 0xDD]);
        let caps = parse_capabilities(&payload)
            .expect("parse")
            .expect("accepted");
        assert_eq!(caps.features, 0x03);
        assert_eq!(caps.interfaces, [0x01, 0x02]);
        assert_eq!(caps.max_connections, 1);
        assert_eq!(caps.max_routing_table_size, 0x0200);
        assert_eq!(caps.max_control_payload, 0xFF);
        assert_eq!(caps.max_parameter_size, 0x0100);
        assert_eq!(caps.manufacturer_id, 0x10);
        assert_eq!(caps.manufacturer_info, [0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[rstest]
    #[case(&[0x03])]
    #[case(&[0x06, 0x00])]
    fn refusal_yields_no_capabilities(#[case] payload: &[u8]) {
        assert_eq!(parse_capabilities(payload), Ok(None));
    }

    #[test]
    fn short_payload_is_an_overrun() {
        let err = parse_capabilities(&INIT_RSP[..7]).expect_err("truncated");
        assert!(matches!(err, FrameError::FieldOverrun { field: "interfaces", .. }));
    }
}
