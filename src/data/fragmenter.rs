//! Outbound helper that splits connection payloads into data segments.
//!
//! [`Fragmenter`] cuts the head of a send queue into segments no larger than
//! the payload size negotiated for the connection. Every segment except the
//! last carries the packet boundary flag. The caller decides how many segments
//! to take, which is how credit accounting pauses a buffer part-way through.

use std::num::NonZeroUsize;

use bytes::Bytes;

/// One segment cut from a connection payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Segment bytes.
    pub payload: Bytes,
    /// Set when more segments of the same payload follow.
    pub more: bool,
}

/// Splits payloads into segments of at most `max_segment_size` bytes.
#[derive(Clone, Copy, Debug)]
pub struct Fragmenter {
    max_segment_size: NonZeroUsize,
}

impl Fragmenter {
    /// Create a fragmenter that caps segments at `max_segment_size` bytes.
    #[must_use]
    pub const fn new(max_segment_size: NonZeroUsize) -> Self { Self { max_segment_size } }

    /// Fragmenter for a connection's negotiated payload size, if it has one.
    #[must_use]
    pub fn for_payload_size(max_payload: u8) -> Option<Self> {
        NonZeroUsize::new(usize::from(max_payload)).map(Self::new)
    }

    /// Return the maximum segment size in bytes.
    #[must_use]
    pub const fn max_segment_size(&self) -> NonZeroUsize { self.max_segment_size }

    /// Cut the next segment off the front of `remaining`.
    ///
    /// `remaining` keeps whatever is left; `more` is set when it is non-empty.
    pub fn next_segment(&self, remaining: &mut Bytes) -> Segment {
        let take = remaining.len().min(self.max_segment_size.get());
        let payload = remaining.split_to(take);
        Segment {
            payload,
            more: !remaining.is_empty(),
        }
    }

    /// Split a whole payload into its segments.
    ///
    /// An empty payload yields one empty final segment.
    #[must_use]
    pub fn segments(&self, payload: Bytes) -> Vec<Segment> {
        let mut remaining = payload;
        let mut out = Vec::new();
        loop {
            let segment = self.next_segment(&mut remaining);
            let more = segment.more;
            out.push(segment);
            if !more {
                return out;
            }
        }
    }
}
