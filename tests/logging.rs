//! Log output of the engine, captured through the `log` facade.

use std::sync::Arc;

use log::Level;
use ncilink::{NciConfig, TraceLevel};
use ncilink_testing::{
    LoggerHandle,
    RecordingCallbacks,
    ScriptedTransport,
    TestEngine,
    drive_enable,
    enabled_engine,
    engine_with,
    logger,
};
use rstest::rstest;
use serial_test::serial;

type Enabled = (TestEngine, ScriptedTransport, Arc<RecordingCallbacks>);

fn contains(records: &[(Level, String)], level: Level, needle: &str) -> bool {
    records
        .iter()
        .any(|(lvl, msg)| *lvl == level && msg.contains(needle))
}

#[rstest]
#[serial]
fn unexpected_response_is_logged_as_an_error(mut logger: LoggerHandle, enabled_engine: Enabled) {
    let (mut engine, _transport, _events) = enabled_engine;
    logger.drain();

    engine.on_bytes(&[0x40, 0x02, 0x01, 0x00]);

    let records = logger.drain();
    assert!(
        contains(&records, Level::Error, "unexpected response CORE_SET_CONFIG"),
        "records: {records:?}"
    );
}

#[rstest]
#[serial]
fn truncated_packet_is_logged_as_a_warning(mut logger: LoggerHandle, enabled_engine: Enabled) {
    let (mut engine, _transport, _events) = enabled_engine;
    logger.drain();

    engine.on_bytes(&[0x60]);

    let records = logger.drain();
    assert!(
        contains(&records, Level::Warn, "dropping inbound packet"),
        "records: {records:?}"
    );
}

#[rstest]
#[serial]
fn command_timeout_is_logged(mut logger: LoggerHandle, enabled_engine: Enabled) {
    let (mut engine, _transport, _events) = enabled_engine;
    engine.get_routing().expect("accepted");
    logger.drain();

    let deadline = engine.next_deadline().expect("response timer armed");
    engine.on_tick(deadline);

    let records = logger.drain();
    assert!(contains(&records, Level::Error, "command timeout"), "records: {records:?}");
    assert!(contains(&records, Level::Error, "recovery failed"), "records: {records:?}");
}

#[rstest]
#[case(TraceLevel::Debug, true)]
#[case(TraceLevel::Event, false)]
#[serial]
fn packet_dumps_follow_the_trace_level(
    mut logger: LoggerHandle,
    #[case] level: TraceLevel,
    #[case] dumped: bool,
) {
    let (mut engine, transport, events) = engine_with(NciConfig {
        trace_level: level,
        ..NciConfig::default()
    });
    drive_enable(&mut engine, &transport, &events);
    logger.drain();

    engine.get_config(&[0x00]).expect("accepted");

    let records = logger.drain();
    assert_eq!(contains(&records, Level::Debug, "tx cmd: 20 03"), dumped, "records: {records:?}");
}

#[rstest]
#[serial]
fn api_calls_are_traced_at_api_level(mut logger: LoggerHandle, enabled_engine: Enabled) {
    let (mut engine, _transport, _events) = enabled_engine;
    logger.drain();

    engine.get_routing().expect("accepted");

    let records = logger.drain();
    assert!(contains(&records, Level::Info, "get_routing (state IDLE)"), "records: {records:?}");
}
