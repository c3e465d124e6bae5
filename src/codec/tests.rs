//! Unit tests for NCI packet encoding and decoding.
//!
//! Covers the bit layout of each message type, rejection of truncated and
//! reserved packets, and prefix decoding of back-to-back packets.

use bytes::Bytes;
use proptest::prelude::*;
use rstest::rstest;

use super::*;

#[test]
fn core_reset_command_layout() {
    let bytes = command(Gid::CORE, opcode::core::RESET, vec![0x01]).expect("encode reset");
    assert_eq!(bytes.as_ref(), &[0x20, 0x00, 0x01, 0x01]);
}

#[rstest]
#[case(&[0x40, 0x00, 0x01, 0x00], MessageType::Response, Gid::CORE, 0x00)]
#[case(&[0x61, 0x05, 0x00], MessageType::Notification, Gid::RF_MANAGE, 0x05)]
#[case(&[0x22, 0x01, 0x00], MessageType::Command, Gid::EE_MANAGE, 0x01)]
#[case(&[0x4F, 0x3F, 0x00], MessageType::Response, Gid::PROPRIETARY, 0x3F)]
fn decodes_control_fields(
    #[case] raw: &[u8],
    #[case] mt: MessageType,
    #[case] gid: Gid,
    #[case] oid: u8,
) {
    let frame = Frame::decode(raw).expect("well-formed control packet");
    assert_eq!(frame.message_type(), mt);
    let (Frame::Command(control) | Frame::Response(control) | Frame::Notification(control)) =
        frame
    else {
        panic!("expected a control packet");
    };
    assert_eq!(control.gid, gid);
    assert_eq!(control.oid, oid);
    assert_eq!(control.payload.len(), raw.len() - HEADER_LEN);
}

#[test]
fn data_packet_carries_connection_id_and_boundary_flag() {
    let frame = Frame::decode(&[0x13, 0x00, 0x02, 0xAA, 0xBB]).expect("data packet");
    assert_eq!(
        frame,
        Frame::Data(DataFrame {
            conn_id: 3,
            pbf: true,
            payload: Bytes::from_static(&[0xAA, 0xBB]),
        })
    );
}

#[test]
fn reserved_message_type_is_rejected() {
    assert_eq!(
        Frame::decode(&[0x80, 0x00, 0x00]),
        Err(FrameError::UnknownMessageType { type_id: 4 })
    );
}

#[test]
fn short_header_is_rejected() {
    assert_eq!(
        Frame::decode(&[0x40, 0x00]),
        Err(FrameError::IncompleteHeader { have: 2, need: 3 })
    );
}

#[test]
fn declared_length_beyond_buffer_is_rejected() {
    assert_eq!(
        Frame::decode(&[0x40, 0x01, 0x05, 0x00, 0x01]),
        Err(FrameError::Truncated {
            declared: 5,
            available: 2,
        })
    );
}

#[test]
fn exact_decode_rejects_trailing_bytes() {
    assert_eq!(
        Frame::decode(&[0x40, 0x00, 0x01, 0x00, 0x60]),
        Err(FrameError::TrailingBytes { extra: 1 })
    );
}

#[test]
fn prefix_decode_walks_concatenated_packets() {
    let raw = [0x40, 0x00, 0x01, 0x00, 0x60, 0x06, 0x03, 0x01, 0x00, 0x01];
    let (first, used) = Frame::decode_prefix(&raw).expect("first packet");
    assert_eq!(used, 4);
    assert!(matches!(first, Frame::Response(_)));
    let (second, rest) = Frame::decode_prefix(&raw[used..]).expect("second packet");
    assert_eq!(rest, 6);
    assert!(matches!(second, Frame::Notification(ref c) if c.oid == opcode::core::CONN_CREDITS));
}

#[test]
fn oversized_payload_cannot_be_encoded() {
    let err = command(Gid::CORE, opcode::core::SET_CONFIG, vec![0_u8; 256])
        .expect_err("payload too large");
    assert_eq!(err, FrameError::OversizedPayload { size: 256, max: 255 });
}

fn control_strategy() -> impl Strategy<Value = ControlFrame> {
    (
        0_u8..16,
        0_u8..64,
        any::<bool>(),
        proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_LEN),
    )
        .prop_map(|(gid, oid, pbf, payload)| ControlFrame {
            gid: Gid::new(gid),
            oid,
            pbf,
            payload: Bytes::from(payload),
        })
}

fn frame_strategy() -> impl Strategy<Value = Frame> {
    prop_oneof![
        control_strategy().prop_map(Frame::Command),
        control_strategy().prop_map(Frame::Response),
        control_strategy().prop_map(Frame::Notification),
        (
            0_u8..16,
            any::<bool>(),
            proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_LEN),
        )
            .prop_map(|(conn_id, pbf, payload)| Frame::Data(DataFrame {
                conn_id,
                pbf,
                payload: Bytes::from(payload),
            })),
    ]
}

proptest! {
    #[test]
    fn wire_bytes_survive_decode_then_encode(frame in frame_strategy()) {
        let wire = frame.encode().expect("strategy stays within limits");
        let decoded = Frame::decode(&wire).expect("encoded packets decode");
        prop_assert_eq!(decoded.encode().expect("re-encode"), wire);
        prop_assert_eq!(decoded, frame);
    }

    #[test]
    fn truncation_is_always_detected(frame in frame_strategy(), cut in 1_usize..=MAX_PAYLOAD_LEN) {
        let wire = frame.encode().expect("strategy stays within limits");
        prop_assume!(wire.len() > HEADER_LEN);
        let keep = wire.len().saturating_sub(cut).max(HEADER_LEN);
        prop_assume!(keep < wire.len());
        let is_truncated = matches!(
            Frame::decode(&wire[..keep]),
            Err(FrameError::Truncated { .. })
        );
        prop_assert!(is_truncated);
    }
}
