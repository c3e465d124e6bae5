//! Builders for packets a controller sends.

use ncilink::{
    codec::{ControlFrame, DataFrame, Frame, Gid},
    conn::ConnId,
};

/// CORE_RESET response accepting NCI 1.0 and keeping configuration.
pub const RESET_RSP: [u8; 6] = [0x40, 0x00, 0x03, 0x00, 0x10, 0x01];

/// CORE_INIT response advertising the frame and ISO-DEP interfaces, four
/// logical connections and a 512-byte routing table.
pub const INIT_RSP: [u8; 22] = [
    0x40, 0x01, 0x13, 0x00, 0x03, 0x00, 0x00, 0x00, 0x02, 0x01, 0x02, 0x01, 0x00, 0x02, 0xFF,
    0x00, 0x01, 0x10, 0xAA, 0xBB, 0xCC, 0xDD,
];

/// OK response to RF_DISCOVER_MAP.
pub const DISCOVER_MAP_RSP: [u8; 4] = [0x41, 0x00, 0x01, 0x00];

/// CORE_RESET command sent by the engine.
pub const RESET_CMD: [u8; 4] = [0x20, 0x00, 0x01, 0x01];

/// CORE_INIT command sent by the engine.
pub const INIT_CMD: [u8; 3] = [0x20, 0x01, 0x00];

fn encode(frame: &Frame) -> Vec<u8> {
    frame
        .encode()
        .map(|bytes| bytes.to_vec())
        .unwrap_or_else(|err| panic!("test packet does not fit: {err}"))
}

/// Unsegmented response packet.
///
/// # Panics
///
/// Panics if `payload` exceeds one packet.
#[must_use]
pub fn response(gid: Gid, oid: u8, payload: &[u8]) -> Vec<u8> {
    encode(&Frame::Response(ControlFrame::new(
        gid,
        oid,
        payload.to_vec(),
    )))
}

/// Unsegmented notification packet.
///
/// # Panics
///
/// Panics if `payload` exceeds one packet.
#[must_use]
pub fn notification(gid: Gid, oid: u8, payload: &[u8]) -> Vec<u8> {
    encode(&Frame::Notification(ControlFrame::new(
        gid,
        oid,
        payload.to_vec(),
    )))
}

/// Data packet on connection `id`.
///
/// # Panics
///
/// Panics if `payload` exceeds one packet.
#[must_use]
pub fn data(id: ConnId, more: bool, payload: &[u8]) -> Vec<u8> {
    encode(&Frame::Data(DataFrame {
        conn_id: id.get(),
        pbf: more,
        payload: payload.to_vec().into(),
    }))
}

/// CORE_CONN_CREDITS notification granting `credits` to `id`.
#[must_use]
pub fn credits(id: ConnId, credits: u8) -> Vec<u8> { vec![0x60, 0x06, 0x03, 0x01, id.get(), credits] }

/// CORE_CONN_CREATE response assigning `id`.
#[must_use]
pub fn conn_created(id: ConnId, max_payload: u8, credits: u8) -> Vec<u8> {
    vec![0x40, 0x04, 0x04, 0x00, max_payload, credits, id.get()]
}

/// RF_INTF_ACTIVATED notification for poll-mode NFC-A.
#[must_use]
pub fn activated(protocol: u8, interface: u8, max_payload: u8, credits: u8) -> Vec<u8> {
    vec![
        0x61, 0x05, 0x0A, 0x01, interface, protocol, 0x00, max_payload, credits, 0x00, 0x00, 0x01,
        0x01,
    ]
}

/// RF_DEACTIVATE notification.
#[must_use]
pub fn deactivated(kind: u8, reason: u8) -> Vec<u8> { vec![0x61, 0x06, 0x02, kind, reason] }
