//! NCI packet header layout.
//!
//! ```text
//!  byte 0: | MT (3) | PBF (1) | GID or conn id (4) |
//!  byte 1: | RFU (2) | OID (6) |   (reserved for data packets)
//!  byte 2: | payload length  |
//! ```

use super::FrameError;

/// Size of every NCI packet header in bytes.
pub const HEADER_LEN: usize = 3;
/// Largest payload a single packet can carry.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

const MT_MASK: u8 = 0xE0;
const MT_SHIFT: u8 = 5;
const PBF_MASK: u8 = 0x10;
const ID_MASK: u8 = 0x0F;
const OID_MASK: u8 = 0x3F;

/// Message type carried in the top three bits of the first header byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Data packet on a logical connection.
    Data,
    /// Host to controller command.
    Command,
    /// Controller answer to the outstanding command.
    Response,
    /// Unsolicited controller notification.
    Notification,
}

impl MessageType {
    /// Raw three-bit value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Data => 0,
            Self::Command => 1,
            Self::Response => 2,
            Self::Notification => 3,
        }
    }

    /// Decode the three-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::UnknownMessageType`] for the reserved values 4..=7.
    pub const fn from_bits(bits: u8) -> Result<Self, FrameError> {
        match bits {
            0 => Ok(Self::Data),
            1 => Ok(Self::Command),
            2 => Ok(Self::Response),
            3 => Ok(Self::Notification),
            type_id => Err(FrameError::UnknownMessageType { type_id }),
        }
    }

    /// Short label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Command => "cmd",
            Self::Response => "rsp",
            Self::Notification => "ntf",
        }
    }
}

/// Group identifier of a control packet.
///
/// Unknown groups are representable so the router can log and drop them
/// instead of failing the decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Gid(u8);

impl Gid {
    /// Core group.
    pub const CORE: Self = Self(0x0);
    /// RF management group.
    pub const RF_MANAGE: Self = Self(0x1);
    /// NFCEE management group.
    pub const EE_MANAGE: Self = Self(0x2);
    /// Proprietary (vendor) group.
    pub const PROPRIETARY: Self = Self(0xF);

    /// Build a group id from the low four bits of `value`.
    #[must_use]
    pub const fn new(value: u8) -> Self { Self(value & ID_MASK) }

    /// Raw four-bit value.
    #[must_use]
    pub const fn get(self) -> u8 { self.0 }

    /// Canonical group name for traces.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self.0 {
            0x0 => "CORE",
            0x1 => "RF_MANAGE",
            0x2 => "EE_MANAGE",
            0xF => "PROP",
            _ => "UNKNOWN_GID",
        }
    }
}

impl std::fmt::Display for Gid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#x})", self.name(), self.0)
    }
}

/// Decoded three-byte packet header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketHeader {
    /// Message type.
    pub mt: MessageType,
    /// Packet boundary flag: more segments of the same message follow.
    pub pbf: bool,
    /// Group id for control packets, connection id for data packets.
    pub id: u8,
    /// Opcode for control packets; zero for data packets.
    pub oid: u8,
    /// Declared payload length.
    pub len: u8,
}

impl PacketHeader {
    /// Parse the header at the beginning of `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::IncompleteHeader`] if fewer than [`HEADER_LEN`]
    /// bytes are available, or [`FrameError::UnknownMessageType`] for a
    /// reserved message type.
    pub fn parse(buf: &[u8]) -> Result<Self, FrameError> {
        let &[b0, b1, len, ..] = buf else {
            return Err(FrameError::IncompleteHeader {
                have: buf.len(),
                need: HEADER_LEN,
            });
        };
        let mt = MessageType::from_bits((b0 & MT_MASK) >> MT_SHIFT)?;
        let oid = if mt == MessageType::Data { 0 } else { b1 & OID_MASK };
        Ok(Self {
            mt,
            pbf: b0 & PBF_MASK != 0,
            id: b0 & ID_MASK,
            oid,
            len,
        })
    }

    /// Serialise the header to its three wire bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let pbf = if self.pbf { PBF_MASK } else { 0 };
        [
            (self.mt.bits() << MT_SHIFT) | pbf | (self.id & ID_MASK),
            self.oid & OID_MASK,
            self.len,
        ]
    }

    /// Group id of a control packet.
    #[must_use]
    pub const fn gid(&self) -> Gid { Gid::new(self.id) }
}
