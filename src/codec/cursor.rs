//! Bounds-checked cursors over NCI payloads.
//!
//! [`Reader`] walks a borrowed payload and reports a
//! [`FrameError::FieldOverrun`] instead of reading past the end. [`Writer`]
//! builds payloads and refuses to grow beyond [`MAX_PAYLOAD_LEN`].

use bytes::{BufMut, Bytes, BytesMut};

use super::{FrameError, MAX_PAYLOAD_LEN};
use crate::byte_order::{read_network_u16, read_nci_u16, read_nci_u32, write_network_u16, write_nci_u16};

/// Sequential reader over a payload slice.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Start reading at the beginning of `buf`.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self { Self { buf, pos: 0 } }

    /// Bytes not yet consumed.
    #[must_use]
    pub const fn remaining(&self) -> usize { self.buf.len() - self.pos }

    /// Whether every byte has been consumed.
    #[must_use]
    pub const fn is_empty(&self) -> bool { self.remaining() == 0 }

    /// Borrow the unread tail without consuming it.
    #[must_use]
    pub fn peek_rest(&self) -> &'a [u8] { &self.buf[self.pos..] }

    /// Consume and return the unread tail.
    pub fn rest(&mut self) -> &'a [u8] {
        let tail = &self.buf[self.pos..];
        self.pos = self.buf.len();
        tail
    }

    /// Consume `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::FieldOverrun`] if fewer than `len` bytes remain.
    pub fn bytes(&mut self, field: &'static str, len: usize) -> Result<&'a [u8], FrameError> {
        let have = self.remaining();
        if len > have {
            return Err(FrameError::FieldOverrun {
                field,
                need: len,
                have,
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    /// Consume a fixed-size array.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::FieldOverrun`] if fewer than `N` bytes remain.
    pub fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], FrameError> {
        let slice = self.bytes(field, N)?;
        let mut out = [0_u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Consume one byte.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::FieldOverrun`] if the payload is exhausted.
    pub fn u8(&mut self, field: &'static str) -> Result<u8, FrameError> {
        let [value] = self.array::<1>(field)?;
        Ok(value)
    }

    /// Consume a little-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::FieldOverrun`] if fewer than two bytes remain.
    pub fn u16_le(&mut self, field: &'static str) -> Result<u16, FrameError> {
        self.array(field).map(read_nci_u16)
    }

    /// Consume a big-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::FieldOverrun`] if fewer than two bytes remain.
    pub fn u16_be(&mut self, field: &'static str) -> Result<u16, FrameError> {
        self.array(field).map(read_network_u16)
    }

    /// Consume a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::FieldOverrun`] if fewer than four bytes remain.
    pub fn u32_le(&mut self, field: &'static str) -> Result<u32, FrameError> {
        self.array(field).map(read_nci_u32)
    }

    /// Consume a one-byte length prefix followed by that many bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::FieldOverrun`] if the prefix or its body is
    /// missing.
    pub fn length_prefixed(&mut self, field: &'static str) -> Result<&'a [u8], FrameError> {
        let len = self.u8(field)?;
        self.bytes(field, usize::from(len))
    }
}

/// Payload builder capped at [`MAX_PAYLOAD_LEN`] bytes.
#[derive(Debug, Default)]
pub struct Writer {
    buf: BytesMut,
}

impl Writer {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize { self.buf.len() }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    fn reserve(&mut self, extra: usize) -> Result<(), FrameError> {
        let size = self.buf.len().saturating_add(extra);
        if size > MAX_PAYLOAD_LEN {
            return Err(FrameError::OversizedPayload {
                size,
                max: MAX_PAYLOAD_LEN,
            });
        }
        self.buf.reserve(extra);
        Ok(())
    }

    /// Append one byte.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::OversizedPayload`] when the payload is full.
    pub fn u8(&mut self, value: u8) -> Result<&mut Self, FrameError> {
        self.reserve(1)?;
        self.buf.put_u8(value);
        Ok(self)
    }

    /// Append a little-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::OversizedPayload`] when the payload is full.
    pub fn u16_le(&mut self, value: u16) -> Result<&mut Self, FrameError> {
        self.slice(&write_nci_u16(value))
    }

    /// Append a big-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::OversizedPayload`] when the payload is full.
    pub fn u16_be(&mut self, value: u16) -> Result<&mut Self, FrameError> {
        self.slice(&write_network_u16(value))
    }

    /// Append raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::OversizedPayload`] when the bytes do not fit.
    pub fn slice(&mut self, bytes: &[u8]) -> Result<&mut Self, FrameError> {
        self.reserve(bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(self)
    }

    /// Append a count byte derived from `count`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::OversizedPayload`] if `count` exceeds a byte or the
    /// payload is full.
    pub fn count(&mut self, count: usize) -> Result<&mut Self, FrameError> {
        let value = u8::try_from(count).map_err(|_| FrameError::OversizedPayload {
            size: count,
            max: usize::from(u8::MAX),
        })?;
        self.u8(value)
    }

    /// Freeze the payload.
    #[must_use]
    pub fn finish(self) -> Bytes { self.buf.freeze() }
}

#[cfg(test)]
mod tests {
    use super::{Reader, Writer};
    use crate::codec::{FrameError, MAX_PAYLOAD_LEN};

    #[test]
    fn reader_reports_overrun_without_consuming() {
        let mut reader = Reader::new(&[0x01, 0x02]);
        assert_eq!(reader.u8("status").expect("first byte"), 0x01);
        let err = reader.u16_le("version").expect_err("only one byte left");
        assert_eq!(
            err,
            FrameError::FieldOverrun {
                field: "version",
                need: 2,
                have: 1,
            }
        );
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn reader_decodes_mixed_endianness() {
        let mut reader = Reader::new(&[0x34, 0x12, 0x12, 0x34, 0x78, 0x56, 0x34, 0x12]);
        assert_eq!(reader.u16_le("le").expect("le"), 0x1234);
        assert_eq!(reader.u16_be("be").expect("be"), 0x1234);
        assert_eq!(reader.u32_le("features").expect("u32"), 0x1234_5678);
        assert!(reader.is_empty());
    }

    #[test]
    fn length_prefixed_rejects_short_body() {
        let mut reader = Reader::new(&[0x03, 0xAA]);
        assert!(matches!(
            reader.length_prefixed("params"),
            Err(FrameError::FieldOverrun { need: 3, have: 1, .. })
        ));
    }

    #[test]
    fn writer_caps_payload_size() {
        let mut writer = Writer::new();
        writer
            .slice(&[0_u8; MAX_PAYLOAD_LEN])
            .expect("full payload fits");
        assert!(matches!(
            writer.u8(0),
            Err(FrameError::OversizedPayload { size: 256, max: 255 })
        ));
        assert_eq!(writer.len(), MAX_PAYLOAD_LEN);
    }

    #[test]
    fn writer_chains_fields() {
        let mut writer = Writer::new();
        writer
            .u8(0x01)
            .and_then(|w| w.u16_be(0x12FC))
            .and_then(|w| w.u16_le(0x0102))
            .expect("fits");
        assert_eq!(writer.finish().as_ref(), &[0x01, 0x12, 0xFC, 0x02, 0x01]);
    }
}
