//! Property tests driving the engine with generated traffic.

use bytes::Bytes;
use ncilink::{ConnId, ConnKind, conn::UNLIMITED_CREDITS};
use ncilink_testing::{enabled_engine, frames};
use proptest::prelude::*;

const LOOPBACK: ConnId = ConnId::new(1);

proptest! {
    #[test]
    fn arbitrary_inbound_bytes_never_break_the_window(
        chunks in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..40), 1..8),
    ) {
        let (mut engine, _transport, _events) = enabled_engine();
        for chunk in &chunks {
            engine.on_bytes(chunk);
        }
        prop_assert!(engine.command_window() <= 1);
        prop_assert!(engine.get_routing().is_ok() || !engine.state().is_enabled());
    }

    #[test]
    fn outbound_segments_rebuild_the_payload(
        payload in proptest::collection::vec(any::<u8>(), 1..600),
        max_payload in 1u8..=255,
    ) {
        let (mut engine, transport, events) = enabled_engine();
        engine
            .conn_create(ConnKind::Loopback, events.conn_callback())
            .expect("create accepted");
        engine.on_bytes(&frames::conn_created(LOOPBACK, max_payload, UNLIMITED_CREDITS));
        let _ = transport.take_written();

        engine
            .send_data(LOOPBACK, Bytes::from(payload.clone()))
            .expect("send accepted");

        let packets = transport.take_written();
        let expected = payload.len().div_ceil(usize::from(max_payload));
        prop_assert_eq!(packets.len(), expected);
        let mut rebuilt = Vec::new();
        for (index, packet) in packets.iter().enumerate() {
            let last = index + 1 == packets.len();
            prop_assert_eq!(packet[0] & 0x0F, LOOPBACK.get());
            prop_assert_eq!(packet[0] & 0x10 != 0, !last);
            prop_assert_eq!(usize::from(packet[2]), packet.len() - 3);
            prop_assert!(packet[2] <= max_payload);
            rebuilt.extend_from_slice(&packet[3..]);
        }
        prop_assert_eq!(rebuilt, payload);
    }
}
