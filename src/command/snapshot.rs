//! Memory of the last transmitted command.

use bytes::Bytes;

use crate::codec::{FrameError, Gid, HEADER_LEN, PacketHeader};

/// Header and payload of the command currently occupying the window.
///
/// Responses are checked against it, and handlers read back command
/// parameters that the response does not repeat (the connection id of a
/// close, the NFCEE id of a mode set).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderSnapshot {
    header: PacketHeader,
    packet: Bytes,
}

impl HeaderSnapshot {
    /// Capture a snapshot of an encoded command.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] if `packet` does not start with a valid
    /// header.
    pub fn capture(packet: &Bytes) -> Result<Self, FrameError> {
        let header = PacketHeader::parse(packet)?;
        Ok(Self {
            header,
            packet: packet.clone(),
        })
    }

    /// Group id of the command.
    #[must_use]
    pub const fn gid(&self) -> Gid { self.header.gid() }

    /// Opcode of the command.
    #[must_use]
    pub const fn oid(&self) -> u8 { self.header.oid }

    /// Command payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] { self.packet.get(HEADER_LEN..).unwrap_or_default() }

    /// Payload byte at `index`, if the command carried one.
    #[must_use]
    pub fn payload_byte(&self, index: usize) -> Option<u8> { self.payload().get(index).copied() }

    /// Complete wire bytes of the command.
    #[must_use]
    pub fn packet(&self) -> &Bytes { &self.packet }

    /// Whether a response with `header` answers this command.
    #[must_use]
    pub fn matches(&self, header: &PacketHeader) -> bool { self.is_answered_by(header.gid(), header.oid) }

    /// Whether a response in group `gid` with opcode `oid` answers this
    /// command.
    #[must_use]
    pub fn is_answered_by(&self, gid: Gid, oid: u8) -> bool { gid == self.gid() && oid == self.oid() }
}
