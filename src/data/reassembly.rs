//! Inbound helper that stitches data segments back into logical buffers.
//!
//! [`RxQueue`] mirrors the outbound [`Fragmenter`](super::Fragmenter). A
//! segment with the boundary flag set leaves the tail buffer open; the next
//! segment is appended to it until one arrives without the flag. A tail that
//! would grow past the configured cap is tagged oversized instead: it is
//! delivered with [`Status::CONTINUE`] and the new segment starts a fresh
//! buffer, so no bytes are lost.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};

use crate::status::Status;

#[derive(Debug)]
struct RxBuffer {
    data: BytesMut,
    fragmented: bool,
    oversized: bool,
}

impl RxBuffer {
    fn new(payload: &[u8], fragmented: bool) -> Self {
        Self {
            data: BytesMut::from(payload),
            fragmented,
            oversized: false,
        }
    }
}

/// Outcome of feeding one segment into an [`RxQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RxPush {
    /// The segment is the first of a multi-segment transfer.
    pub started: bool,
    /// The previous tail hit the size cap and was closed as oversized.
    pub overflowed: bool,
}

/// Buffer handed to a connection owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    /// [`Status::OK`] for a complete buffer, [`Status::CONTINUE`] when more of
    /// the same logical unit follows.
    pub status: Status,
    /// Buffer contents.
    pub data: Bytes,
}

/// FIFO of inbound buffers for one connection.
#[derive(Debug, Default)]
pub struct RxQueue {
    buffers: VecDeque<RxBuffer>,
    in_transfer: bool,
}

impl RxQueue {
    /// Number of buffers held.
    #[must_use]
    pub fn len(&self) -> usize { self.buffers.len() }

    /// Whether the queue holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.buffers.is_empty() }

    /// Bytes buffered in the open tail, if it is still collecting segments.
    #[must_use]
    pub fn partial_len(&self) -> Option<usize> {
        self.buffers
            .back()
            .filter(|tail| tail.fragmented)
            .map(|tail| tail.data.len())
    }

    /// Discard everything.
    pub fn clear(&mut self) {
        self.buffers.clear();
        self.in_transfer = false;
    }

    /// Add a segment, appending to an open tail when there is one.
    pub fn push(&mut self, payload: &[u8], more: bool, max_size: usize) -> RxPush {
        let started = more && !self.in_transfer;
        self.in_transfer = more;
        let open_tail = self
            .buffers
            .back_mut()
            .filter(|tail| tail.fragmented && !tail.oversized);
        let overflowed = match open_tail {
            Some(tail) if tail.data.len().saturating_add(payload.len()) <= max_size => {
                tail.data.extend_from_slice(payload);
                tail.fragmented = more;
                return RxPush {
                    started,
                    overflowed: false,
                };
            }
            Some(tail) => {
                tail.oversized = true;
                true
            }
            None => false,
        };
        self.buffers.push_back(RxBuffer::new(payload, more));
        RxPush {
            started,
            overflowed,
        }
    }

    /// Pop every buffer that is ready for the owner.
    ///
    /// A head still collecting segments stops delivery unless it is oversized
    /// or `deliver_partial` is set.
    pub fn drain_ready(&mut self, deliver_partial: bool) -> Vec<Delivery> {
        let mut out = Vec::new();
        while let Some(head) = self.buffers.front() {
            if head.fragmented && !head.oversized && !deliver_partial {
                break;
            }
            let Some(head) = self.buffers.pop_front() else {
                break;
            };
            let status = if head.fragmented || head.oversized {
                Status::CONTINUE
            } else {
                Status::OK
            };
            out.push(Delivery {
                status,
                data: head.data.freeze(),
            });
        }
        out
    }
}
