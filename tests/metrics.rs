#![cfg(feature = "metrics")]
//! Counters and gauges recorded while the engine runs.
//!
//! Each test installs a thread-local `DebuggingRecorder` around the engine
//! calls it makes.

use std::sync::Arc;

use bytes::Bytes;
use ncilink::{ConnKind, metrics};
use ncilink_testing::{
    RecordingCallbacks,
    ScriptedTransport,
    TestEngine,
    enabled_engine,
    frames,
    metrics::{counter_total, debugging_recorder, gauge_value},
};
use rstest::rstest;

type Enabled = (TestEngine, ScriptedTransport, Arc<RecordingCallbacks>);

#[rstest]
fn packets_are_counted_by_direction_and_kind(enabled_engine: Enabled) {
    let (mut engine, _transport, _events) = enabled_engine;
    let (snapshotter, recorder) = debugging_recorder();

    ::metrics::with_local_recorder(&recorder, || {
        engine.get_config(&[0x00]).expect("accepted");
        engine.on_bytes(&[0x40, 0x03, 0x02, 0x00, 0x00]);
        engine.on_bytes(&[0x60, 0x07, 0x01, 0x03]);
    });

    let outbound = [("direction", "outbound"), ("kind", "cmd")];
    assert_eq!(counter_total(&snapshotter, metrics::FRAMES_TOTAL, &outbound), 1);
    let inbound = [("direction", "inbound")];
    assert_eq!(counter_total(&snapshotter, metrics::FRAMES_TOTAL, &inbound), 2);
    let notifications = [("direction", "inbound"), ("kind", "ntf")];
    assert_eq!(counter_total(&snapshotter, metrics::FRAMES_TOTAL, &notifications), 1);
}

#[rstest]
fn malformed_and_unmatched_packets_count_as_protocol_errors(enabled_engine: Enabled) {
    let (mut engine, _transport, _events) = enabled_engine;
    let (snapshotter, recorder) = debugging_recorder();

    ::metrics::with_local_recorder(&recorder, || {
        engine.on_bytes(&[0x40, 0x03]);
        engine.on_bytes(&[0x40, 0x02, 0x01, 0x00]);
    });

    assert_eq!(counter_total(&snapshotter, metrics::PROTOCOL_ERRORS_TOTAL, &[]), 2);
}

#[rstest]
fn recovery_outcome_is_recorded(enabled_engine: Enabled) {
    let (mut engine, transport, _events) = enabled_engine;
    let (snapshotter, recorder) = debugging_recorder();
    transport.push_reply(Ok(Bytes::from_static(&frames::RESET_RSP)));
    transport.push_reply(Ok(Bytes::from_static(&frames::INIT_RSP)));

    ::metrics::with_local_recorder(&recorder, || {
        engine.get_routing().expect("accepted");
        let deadline = engine.next_deadline().expect("response timer armed");
        engine.on_tick(deadline);
    });

    assert_eq!(counter_total(&snapshotter, metrics::COMMAND_TIMEOUTS_TOTAL, &[]), 1);
    assert_eq!(
        counter_total(&snapshotter, metrics::RECOVERIES_TOTAL, &[("outcome", "ok")]),
        1
    );
}

#[rstest]
fn open_connections_gauge_follows_create_and_close(enabled_engine: Enabled) {
    let (mut engine, _transport, events) = enabled_engine;
    let (snapshotter, recorder) = debugging_recorder();
    let id = ncilink::ConnId::new(1);

    ::metrics::with_local_recorder(&recorder, || {
        engine
            .conn_create(ConnKind::Loopback, events.conn_callback())
            .expect("accepted");
        engine.on_bytes(&frames::conn_created(id, 4, 1));
    });
    let after_create = gauge_value(&snapshotter, metrics::CONNECTIONS_OPEN);

    ::metrics::with_local_recorder(&recorder, || {
        engine.conn_close(id).expect("accepted");
        engine.on_bytes(&[0x40, 0x05, 0x01, 0x00]);
    });
    let after_close = gauge_value(&snapshotter, metrics::CONNECTIONS_OPEN);

    assert!(after_create.is_some_and(|open| open >= 1.0));
    assert!(after_close.unwrap_or_default() < after_create.unwrap_or_default());
}
