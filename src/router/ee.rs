//! NFCEE management responses and notifications.

use bytes::Bytes;

use super::{snapshot_byte, unknown_opcode};
use crate::{
    codec::{FrameError, Gid, Reader, opcode::ee},
    command::HeaderSnapshot,
    engine::Engine,
    event::ResponseEvent,
    status::Status,
    transport::Transport,
};

impl<T: Transport> Engine<T> {
    pub(super) fn ee_response(
        &mut self,
        oid: u8,
        payload: &[u8],
        snapshot: Option<&HeaderSnapshot>,
    ) -> Result<(), FrameError> {
        let mut reader = Reader::new(payload);
        let status = Status::new(reader.u8("status")?);
        match oid {
            ee::DISCOVER => {
                let num_nfcee = if status.is_ok() { reader.u8("num_nfcee")? } else { 0 };
                self.respond(ResponseEvent::NfceeDiscover { status, num_nfcee });
            }
            ee::MODE_SET => self.respond(ResponseEvent::NfceeModeSet {
                status,
                nfcee_id: snapshot_byte(snapshot, 0),
                mode: snapshot_byte(snapshot, 1),
            }),
            oid => unknown_opcode("response", Gid::EE_MANAGE, oid),
        }
        Ok(())
    }

    pub(super) fn ee_notification(&mut self, oid: u8, payload: &[u8]) -> Result<(), FrameError> {
        match oid {
            ee::DISCOVER => self.respond(ResponseEvent::NfceeInfo(Bytes::copy_from_slice(payload))),
            oid => unknown_opcode("notification", Gid::EE_MANAGE, oid),
        }
        Ok(())
    }
}
