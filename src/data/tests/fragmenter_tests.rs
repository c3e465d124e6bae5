//! Tests for outbound segmentation.

use std::num::NonZeroUsize;

use bytes::Bytes;

use crate::data::{Fragmenter, Segment};

fn assert_segment(segments: &[Segment], index: usize, payload: &[u8], more: bool) {
    let segment = segments
        .get(index)
        .expect("segment missing at requested index");
    assert_eq!(segment.payload.as_ref(), payload);
    assert_eq!(segment.more, more);
}

#[test]
fn fragmenter_splits_payload_into_multiple_segments() {
    let fragmenter = Fragmenter::new(NonZeroUsize::new(3).expect("non-zero"));
    let payload: Vec<u8> = (0..8).collect();
    let segments = fragmenter.segments(Bytes::from(payload));

    assert_eq!(segments.len(), 3);
    assert_segment(&segments, 0, &[0, 1, 2], true);
    assert_segment(&segments, 1, &[3, 4, 5], true);
    assert_segment(&segments, 2, &[6, 7], false);
}

#[test]
fn fragmenter_handles_empty_payload() {
    let fragmenter = Fragmenter::new(NonZeroUsize::new(8).expect("non-zero"));
    let segments = fragmenter.segments(Bytes::new());

    assert_eq!(segments.len(), 1);
    assert_segment(&segments, 0, &[], false);
}

#[test]
fn payload_at_exact_size_is_one_segment() {
    let fragmenter = Fragmenter::new(NonZeroUsize::new(4).expect("non-zero"));
    let segments = fragmenter.segments(Bytes::from_static(&[1, 2, 3, 4]));
    assert_eq!(segments.len(), 1);
    assert_segment(&segments, 0, &[1, 2, 3, 4], false);
}

#[test]
fn next_segment_leaves_remainder_in_place() {
    let fragmenter = Fragmenter::for_payload_size(2).expect("non-zero payload size");
    let mut remaining = Bytes::from_static(b"abcde");
    let first = fragmenter.next_segment(&mut remaining);
    assert_eq!(first.payload.as_ref(), b"ab");
    assert!(first.more);
    assert_eq!(remaining.as_ref(), b"cde");
}

#[test]
fn zero_payload_size_has_no_fragmenter() {
    assert!(Fragmenter::for_payload_size(0).is_none());
}
