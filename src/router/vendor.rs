//! Proprietary packets.

use bytes::Bytes;
use log::debug;

use crate::{codec::MessageType, engine::Engine, event::VendorEvent, transport::Transport};

impl<T: Transport> Engine<T> {
    /// Hand a proprietary packet to every registered vendor listener.
    pub(super) fn vendor_broadcast(&mut self, mt: MessageType, oid: u8, payload: &[u8]) {
        let payload = Bytes::copy_from_slice(payload);
        let mut delivered = 0_usize;
        for listener in self.vendor_listeners.iter_mut().flatten() {
            listener(VendorEvent {
                mt: mt.bits(),
                oid,
                payload: payload.clone(),
            });
            delivered += 1;
        }
        if delivered == 0 {
            debug!("proprietary {} {oid:#04x} has no listener", mt.as_str());
        }
    }
}
