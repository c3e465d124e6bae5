//! The engine behind its actor, driven by a transport that completes through
//! the sink.

use std::time::Duration;

use bytes::Bytes;
use ncilink::{
    ConnEvent, ConnId, ConnKind, Engine, EngineActor, NciConfig, NfcState, ResponseEvent, Status,
    TransportSink,
};
use ncilink_testing::{
    RecordingCallbacks,
    ScriptedTransport,
    frames::{DISCOVER_MAP_RSP, INIT_RSP, RESET_RSP},
};
use tokio_util::sync::CancellationToken;

/// Answer the enable sequence, CONN_CREATE and CONN_CLOSE; loop data back.
fn controller(packet: &[u8]) -> Option<Bytes> {
    let reply: &[u8] = match packet {
        [0x20, 0x00, ..] => &RESET_RSP,
        [0x20, 0x01, ..] => &INIT_RSP,
        [0x21, 0x00, ..] => &DISCOVER_MAP_RSP,
        [0x20, 0x04, ..] => &[0x40, 0x04, 0x04, 0x00, 0x08, 0xFF, 0x01],
        [0x20, 0x05, ..] => &[0x40, 0x05, 0x01, 0x00],
        [0x01, ..] => return Some(Bytes::copy_from_slice(packet)),
        _ => return None,
    };
    Some(Bytes::from_static(reply))
}

async fn settle() { tokio::time::sleep(Duration::from_millis(1)).await; }

#[tokio::test(start_paused = true)]
async fn loopback_round_trip_through_the_actor() {
    let (sink, inbound) = TransportSink::channel();
    let transport = ScriptedTransport::with_sink(sink, controller);
    let events = RecordingCallbacks::new();
    let engine = Engine::new(transport.clone(), NciConfig::default(), events.hooks());
    let shutdown = CancellationToken::new();
    let (actor, handle) = EngineActor::new(engine, inbound, shutdown.clone());
    let task = actor.spawn();

    handle.enable().await.expect("enable accepted");
    settle().await;
    assert_eq!(handle.state().await.expect("state"), NfcState::Idle);
    assert!(matches!(
        events.take_responses().as_slice(),
        [ResponseEvent::Enabled { status: Status::OK, .. }]
    ));

    let conn = handle
        .conn_create(ConnKind::Loopback, events.conn_callback())
        .await
        .expect("create accepted");
    settle().await;
    assert!(conn.slot() > 0);
    let id = ConnId::new(1);

    handle
        .send_data(id, Bytes::from_static(&[0xCA, 0xFE]))
        .await
        .expect("send accepted");
    settle().await;
    handle.conn_close(id).await.expect("close accepted");
    settle().await;

    assert_eq!(
        events.take_conn_events(),
        [
            (
                id,
                ConnEvent::Created {
                    status: Status::OK,
                    max_payload: 8,
                    credits: 0xFF,
                }
            ),
            (
                id,
                ConnEvent::Data {
                    status: Status::OK,
                    data: Bytes::from_static(&[0xCA, 0xFE]),
                }
            ),
            (id, ConnEvent::Closed { status: Status::OK }),
        ]
    );

    handle.disable().await.expect("disable accepted");
    settle().await;
    assert_eq!(events.take_responses(), [ResponseEvent::Disabled]);

    shutdown.cancel();
    let engine = task.await.expect("join").expect("actor did not panic");
    assert_eq!(engine.state(), NfcState::Uninitialized);
    assert_eq!(transport.with_log(|log| (log.opens, log.closes)), (1, 1));
}

#[tokio::test(start_paused = true)]
async fn quick_timers_fire_through_the_actor() {
    let (sink, inbound) = TransportSink::channel();
    let events = RecordingCallbacks::new();
    let engine = Engine::new(
        ScriptedTransport::with_sink(sink, controller),
        NciConfig::default(),
        events.hooks(),
    );
    let (actor, handle) = EngineActor::new(engine, inbound, CancellationToken::new());
    let task = actor.spawn();

    handle
        .start_quick_timer(7, Duration::from_millis(250))
        .await
        .expect("actor running");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(events.take_responses().is_empty());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(events.take_responses(), [ResponseEvent::QuickTimer(7)]);

    drop(handle);
    assert!(task.await.expect("join").is_some());
}
