//! Engines prepared for a test.

use std::sync::Arc;

use ncilink::{Engine, HalEvent, NciConfig, Status};
use rstest::fixture;

use crate::{
    frames::{DISCOVER_MAP_RSP, INIT_RSP, RESET_RSP},
    recorder::RecordingCallbacks,
    transport::ScriptedTransport,
};

/// Engine type used by the fixtures.
pub type TestEngine = Engine<ScriptedTransport>;

/// Uninitialised engine with its transport and recorder.
#[must_use]
pub fn engine_with(config: NciConfig) -> (TestEngine, ScriptedTransport, Arc<RecordingCallbacks>) {
    let transport = ScriptedTransport::new();
    let events = RecordingCallbacks::new();
    let engine = Engine::new(transport.clone(), config, events.hooks());
    (engine, transport, events)
}

/// Take `engine` through open, reset, init, post-init and the default
/// discovery map, then clear the transport log and the recorder.
///
/// # Panics
///
/// Panics if the engine refuses to enable.
pub fn drive_enable(engine: &mut TestEngine, transport: &ScriptedTransport, events: &RecordingCallbacks) {
    if let Err(err) = engine.enable() {
        panic!("enable refused: {err}");
    }
    engine.on_hal_event(HalEvent::OpenComplete(Status::OK));
    engine.on_bytes(&RESET_RSP);
    engine.on_bytes(&INIT_RSP);
    engine.on_hal_event(HalEvent::PostInitComplete(Status::OK));
    engine.on_bytes(&DISCOVER_MAP_RSP);
    let _ = transport.take_written();
    events.clear();
}

/// Engine in the idle state with the RF connection bound to the recorder.
#[fixture]
pub fn enabled_engine() -> (TestEngine, ScriptedTransport, Arc<RecordingCallbacks>) {
    let (mut engine, transport, events) = engine_with(NciConfig::default());
    engine.set_static_rf_callback(Some(events.conn_callback()));
    drive_enable(&mut engine, &transport, &events);
    (engine, transport, events)
}
