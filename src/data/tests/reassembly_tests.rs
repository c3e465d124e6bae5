//! Tests for inbound reassembly, oversize tagging and partial delivery.

use proptest::prelude::*;

use crate::{
    data::{Delivery, RxPush, RxQueue},
    status::Status,
};

#[test]
fn single_segment_is_delivered_complete() {
    let mut queue = RxQueue::default();
    let push = queue.push(b"hello", false, 64);
    assert_eq!(
        push,
        RxPush {
            started: false,
            overflowed: false,
        }
    );
    assert_eq!(
        queue.drain_ready(false),
        vec![Delivery {
            status: Status::OK,
            data: "hello".into(),
        }]
    );
    assert!(queue.is_empty());
}

#[test]
fn segments_are_held_until_the_last_arrives() {
    let mut queue = RxQueue::default();
    assert!(queue.push(b"ab", true, 64).started);
    assert!(queue.drain_ready(false).is_empty());
    assert!(!queue.push(b"cd", true, 64).started);
    assert_eq!(queue.partial_len(), Some(4));
    queue.push(b"e", false, 64);
    let delivered = queue.drain_ready(false);
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].data.as_ref(), b"abcde");
    assert_eq!(delivered[0].status, Status::OK);
}

#[test]
fn oversized_tail_is_delivered_with_continue() {
    let mut queue = RxQueue::default();
    queue.push(&[1; 4], true, 6);
    let push = queue.push(&[2; 4], true, 6);
    assert!(push.overflowed);
    queue.push(&[3; 1], false, 6);

    let delivered = queue.drain_ready(false);
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].status, Status::CONTINUE);
    assert_eq!(delivered[0].data.as_ref(), &[1; 4]);
    assert_eq!(delivered[1].status, Status::OK);
    assert_eq!(delivered[1].data.as_ref(), &[2, 2, 2, 2, 3]);
}

#[test]
fn partial_delivery_reports_each_segment() {
    let mut queue = RxQueue::default();
    assert!(queue.push(b"ab", true, 64).started);
    let first = queue.drain_ready(true);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].status, Status::CONTINUE);

    assert!(!queue.push(b"cd", false, 64).started);
    let last = queue.drain_ready(true);
    assert_eq!(last[0].status, Status::OK);
    assert_eq!(last[0].data.as_ref(), b"cd");
}

#[test]
fn clear_drops_open_transfer() {
    let mut queue = RxQueue::default();
    queue.push(b"ab", true, 64);
    queue.clear();
    assert!(queue.is_empty());
    assert!(queue.push(b"cd", true, 64).started);
}

proptest! {
    #[test]
    fn fragments_concatenate_into_one_buffer(
        chunks in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..40), 1..12)
    ) {
        let total: usize = chunks.iter().map(Vec::len).sum();
        let mut queue = RxQueue::default();
        let last = chunks.len() - 1;
        for (index, chunk) in chunks.iter().enumerate() {
            queue.push(chunk, index != last, total.max(1));
        }
        let delivered = queue.drain_ready(false);
        prop_assert_eq!(delivered.len(), 1);
        prop_assert_eq!(delivered[0].status, Status::OK);
        prop_assert_eq!(delivered[0].data.to_vec(), chunks.concat());
    }
}
