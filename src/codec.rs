//! NCI packet framing.
//!
//! Control packets (`Command`, `Response`, `Notification`) carry a group id
//! and opcode; data packets carry a logical connection id instead. Decoding
//! validates the declared length against the buffer before any payload byte is
//! handed out, so a truncated packet is rejected as a whole.
//!
//! ```
//! use ncilink::codec::{ControlFrame, Frame, Gid};
//!
//! let reset = Frame::Command(ControlFrame::new(Gid::CORE, 0x00, vec![0x01]));
//! let bytes = reset.encode().expect("payload fits");
//! assert_eq!(bytes.as_ref(), &[0x20, 0x00, 0x01, 0x01]);
//! assert_eq!(Frame::decode(&bytes).expect("well formed"), reset);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

pub mod cursor;
pub mod error;
mod header;
pub mod opcode;

pub use cursor::{Reader, Writer};
pub use error::FrameError;
pub use header::{Gid, HEADER_LEN, MAX_PAYLOAD_LEN, MessageType, PacketHeader};

/// Group-addressed packet body shared by commands, responses and
/// notifications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlFrame {
    /// Group id.
    pub gid: Gid,
    /// Opcode within the group.
    pub oid: u8,
    /// Segmentation flag.
    pub pbf: bool,
    /// Packet payload.
    pub payload: Bytes,
}

impl ControlFrame {
    /// Build an unsegmented control packet.
    #[must_use]
    pub fn new(gid: Gid, oid: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            gid,
            oid,
            pbf: false,
            payload: payload.into(),
        }
    }

    /// Canonical opcode name for traces.
    #[must_use]
    pub fn name(&self) -> &'static str { opcode::name(self.gid, self.oid) }
}

/// Packet on a logical connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataFrame {
    /// Logical connection id (four bits).
    pub conn_id: u8,
    /// Set when more segments of the same message follow.
    pub pbf: bool,
    /// Segment payload.
    pub payload: Bytes,
}

/// Decoded NCI packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// Host to controller command.
    Command(ControlFrame),
    /// Controller response.
    Response(ControlFrame),
    /// Controller notification.
    Notification(ControlFrame),
    /// Connection data.
    Data(DataFrame),
}

impl Frame {
    /// Message type of this packet.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Command(_) => MessageType::Command,
            Self::Response(_) => MessageType::Response,
            Self::Notification(_) => MessageType::Notification,
            Self::Data(_) => MessageType::Data,
        }
    }

    fn payload(&self) -> &Bytes {
        match self {
            Self::Command(c) | Self::Response(c) | Self::Notification(c) => &c.payload,
            Self::Data(d) => &d.payload,
        }
    }

    /// Header describing this packet.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::OversizedPayload`] if the payload exceeds
    /// [`MAX_PAYLOAD_LEN`].
    pub fn header(&self) -> Result<PacketHeader, FrameError> {
        let size = self.payload().len();
        let len = u8::try_from(size).map_err(|_| FrameError::OversizedPayload {
            size,
            max: MAX_PAYLOAD_LEN,
        })?;
        let mt = self.message_type();
        Ok(match self {
            Self::Command(c) | Self::Response(c) | Self::Notification(c) => PacketHeader {
                mt,
                pbf: c.pbf,
                id: c.gid.get(),
                oid: c.oid,
                len,
            },
            Self::Data(d) => PacketHeader {
                mt,
                pbf: d.pbf,
                id: d.conn_id,
                oid: 0,
                len,
            },
        })
    }

    /// Serialise the packet to wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::OversizedPayload`] if the payload exceeds
    /// [`MAX_PAYLOAD_LEN`].
    pub fn encode(&self) -> Result<Bytes, FrameError> {
        let header = self.header()?;
        let payload = self.payload();
        let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
        buf.put_slice(&header.to_bytes());
        buf.put_slice(payload);
        Ok(buf.freeze())
    }

    /// Decode exactly one packet occupying all of `buf`.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] if the header is incomplete or reserved, if the
    /// declared length exceeds the buffer, or if bytes trail the packet.
    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        let (frame, used) = Self::decode_prefix(buf)?;
        if used != buf.len() {
            return Err(FrameError::TrailingBytes {
                extra: buf.len() - used,
            });
        }
        Ok(frame)
    }

    /// Decode the packet at the start of `buf`, returning it together with
    /// the number of bytes it occupied.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] if the header is incomplete or reserved, or if
    /// the declared length exceeds the buffer.
    pub fn decode_prefix(buf: &[u8]) -> Result<(Self, usize), FrameError> {
        let header = PacketHeader::parse(buf)?;
        let declared = usize::from(header.len);
        let available = buf.len() - HEADER_LEN;
        if declared > available {
            return Err(FrameError::Truncated {
                declared,
                available,
            });
        }
        let end = HEADER_LEN + declared;
        let payload = Bytes::copy_from_slice(&buf[HEADER_LEN..end]);
        Ok((Self::from_parts(header, payload), end))
    }

    fn from_parts(header: PacketHeader, payload: Bytes) -> Self {
        match header.mt {
            MessageType::Data => Self::Data(DataFrame {
                conn_id: header.id,
                pbf: header.pbf,
                payload,
            }),
            mt => {
                let control = ControlFrame {
                    gid: header.gid(),
                    oid: header.oid,
                    pbf: header.pbf,
                    payload,
                };
                match mt {
                    MessageType::Command => Self::Command(control),
                    MessageType::Response => Self::Response(control),
                    _ => Self::Notification(control),
                }
            }
        }
    }
}

/// Build the wire bytes of an unsegmented command.
///
/// # Errors
///
/// Returns [`FrameError::OversizedPayload`] if `payload` does not fit one
/// packet.
pub fn command(gid: Gid, oid: u8, payload: impl Into<Bytes>) -> Result<Bytes, FrameError> {
    Frame::Command(ControlFrame::new(gid, oid, payload)).encode()
}

#[cfg(test)]
mod tests;
