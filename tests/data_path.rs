//! Logical connections, credit flow and reassembly.

use std::sync::Arc;

use bytes::Bytes;
use ncilink::{
    ConnEvent, ConnId, ConnKind, DeactivateType, DiscoverEvent, NciConfig, NciError, NfcState,
    Status,
    params::{interface, protocol},
};
use ncilink_testing::{
    RecordingCallbacks,
    ScriptedTransport,
    TestEngine,
    TestResult,
    drive_enable,
    enabled_engine,
    engine_with,
    frames,
};
use rstest::rstest;

type Enabled = (TestEngine, ScriptedTransport, Arc<RecordingCallbacks>);

const LOOPBACK: ConnId = ConnId::new(1);

fn written(transport: &ScriptedTransport) -> Vec<Vec<u8>> {
    transport
        .take_written()
        .into_iter()
        .map(|packet| packet.to_vec())
        .collect()
}

/// Create a loopback connection with a four-byte payload and `credits`.
fn loopback(engine: &mut TestEngine, transport: &ScriptedTransport, events: &Arc<RecordingCallbacks>, credits: u8) {
    engine
        .conn_create(ConnKind::Loopback, events.conn_callback())
        .expect("create accepted");
    assert_eq!(written(transport), [vec![0x20, 0x04, 0x02, 0x01, 0x00]]);
    engine.on_bytes(&frames::conn_created(LOOPBACK, 4, credits));
    assert_eq!(
        events.take_conn_events(),
        [(
            LOOPBACK,
            ConnEvent::Created {
                status: Status::OK,
                max_payload: 4,
                credits,
            }
        )]
    );
}

#[rstest]
fn sends_pause_without_credits(enabled_engine: Enabled) -> TestResult {
    let (mut engine, transport, events) = enabled_engine;
    loopback(&mut engine, &transport, &events, 1);

    engine.send_data(LOOPBACK, Bytes::from_static(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]))?;
    assert_eq!(written(&transport), [vec![0x11, 0x00, 0x04, 1, 2, 3, 4]]);

    engine.on_bytes(&frames::credits(LOOPBACK, 1));
    assert_eq!(written(&transport), [vec![0x11, 0x00, 0x04, 5, 6, 7, 8]]);

    engine.on_bytes(&frames::credits(LOOPBACK, 1));
    assert_eq!(written(&transport), [vec![0x01, 0x00, 0x02, 9, 10]]);
    assert_eq!(engine.connection(LOOPBACK).map(|block| block.credits()), Some(0));
    Ok(())
}

#[rstest]
fn flush_discards_what_has_not_been_sent(enabled_engine: Enabled) -> TestResult {
    let (mut engine, transport, events) = enabled_engine;
    loopback(&mut engine, &transport, &events, 1);
    engine.send_data(LOOPBACK, Bytes::from_static(&[1, 2, 3, 4, 5]))?;
    written(&transport);

    engine.flush_data(LOOPBACK)?;
    engine.on_bytes(&frames::credits(LOOPBACK, 1));
    assert!(written(&transport).is_empty());
    Ok(())
}

#[rstest]
fn inbound_segments_are_joined(enabled_engine: Enabled) {
    let (mut engine, transport, events) = enabled_engine;
    loopback(&mut engine, &transport, &events, 1);

    engine.on_bytes(&frames::data(LOOPBACK, true, &[1, 2]));
    assert!(events.take_conn_events().is_empty());
    engine.on_bytes(&frames::data(LOOPBACK, false, &[3]));

    assert_eq!(
        events.take_conn_events(),
        [(
            LOOPBACK,
            ConnEvent::Data {
                status: Status::OK,
                data: Bytes::from_static(&[1, 2, 3]),
            }
        )]
    );
}

#[rstest]
fn closing_releases_the_connection(enabled_engine: Enabled) -> TestResult {
    let (mut engine, transport, events) = enabled_engine;
    loopback(&mut engine, &transport, &events, 1);

    engine.conn_close(LOOPBACK)?;
    assert_eq!(written(&transport), [vec![0x20, 0x05, 0x01, 0x01]]);
    engine.on_bytes(&[0x40, 0x05, 0x01, 0x00]);

    assert_eq!(
        events.take_conn_events(),
        [(LOOPBACK, ConnEvent::Closed { status: Status::OK })]
    );
    assert!(engine.connection(LOOPBACK).is_none());
    assert!(matches!(
        engine.send_data(LOOPBACK, Bytes::from_static(&[1])),
        Err(NciError::BadHandle)
    ));
    Ok(())
}

#[rstest]
fn rf_link_carries_data_once_activated(enabled_engine: Enabled) -> TestResult {
    let (mut engine, transport, events) = enabled_engine;
    assert!(matches!(
        engine.send_data(ConnId::RF, Bytes::from_static(&[0x00])),
        Err(NciError::WrongProtocol)
    ));

    engine.on_bytes(&frames::activated(protocol::ISO_DEP, interface::ISO_DEP, 0x10, 1));
    assert_eq!(engine.state(), NfcState::Open);
    assert!(matches!(
        events.take_discovers().as_slice(),
        [DiscoverEvent::Activated(_)]
    ));

    engine.send_data(ConnId::RF, Bytes::from_static(&[0x00, 0xA4]))?;
    assert_eq!(written(&transport), [vec![0x00, 0x00, 0x02, 0x00, 0xA4]]);

    engine.on_bytes(&frames::data(ConnId::RF, false, &[0x90, 0x00]));
    assert_eq!(
        events.take_conn_events(),
        [(
            ConnId::RF,
            ConnEvent::Data {
                status: Status::OK,
                data: Bytes::from_static(&[0x90, 0x00]),
            }
        )]
    );
    Ok(())
}

#[rstest]
fn deactivation_returns_to_idle(enabled_engine: Enabled) -> TestResult {
    let (mut engine, _transport, events) = enabled_engine;
    engine.on_bytes(&frames::activated(protocol::ISO_DEP, interface::ISO_DEP, 0x10, 1));
    events.clear();

    engine.on_bytes(&frames::deactivated(0x00, 0x00));

    assert_eq!(engine.state(), NfcState::Idle);
    let events_seen = events.take_conn_events();
    assert!(matches!(
        events_seen.as_slice(),
        [(ConnId::RF, ConnEvent::Deactivated(deactivation))]
            if deactivation.kind == DeactivateType::Idle && deactivation.is_ntf
    ));
    Ok(())
}

#[test]
fn reassembly_can_be_turned_off_for_the_rf_link() {
    let (mut engine, transport, events) = engine_with(NciConfig {
        reassembly_enabled: false,
        ..NciConfig::default()
    });
    engine.set_static_rf_callback(Some(events.conn_callback()));
    drive_enable(&mut engine, &transport, &events);
    engine.on_bytes(&frames::activated(protocol::ISO_DEP, interface::ISO_DEP, 0x10, 1));
    events.clear();

    engine.on_bytes(&frames::data(ConnId::RF, true, &[1, 2]));
    engine.on_bytes(&frames::data(ConnId::RF, false, &[3]));

    let data: Vec<_> = events
        .take_conn_events()
        .into_iter()
        .filter_map(|(_, event)| match event {
            ConnEvent::Data { status, data } => Some((status, data.to_vec())),
            _ => None,
        })
        .collect();
    assert_eq!(
        data,
        [(Status::CONTINUE, vec![1, 2]), (Status::OK, vec![3])]
    );
}
