#![cfg(test)]
//! Test-only transport and event recorders shared by the unit tests.

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex},
};

use bytes::Bytes;

use crate::{
    config::NciConfig,
    conn::{ConnCallback, ConnId},
    engine::Engine,
    event::{ConnEvent, DiscoverEvent, ResponseEvent},
    hooks::Hooks,
    status::Status,
    transport::{HalEvent, Transport},
};

/// CORE_RESET response accepting NCI 1.0 and keeping configuration.
pub const RESET_RSP: [u8; 6] = [0x40, 0x00, 0x03, 0x00, 0x10, 0x01];

/// CORE_INIT response advertising the frame and ISO-DEP interfaces and a
/// 512-byte routing table.
pub const INIT_RSP: [u8; 22] = [
    0x40, 0x01, 0x13, 0x00, 0x03, 0x00, 0x00, 0x00, 0x02, 0x01, 0x02, 0x01, 0x00, 0x02, 0xFF,
    0x00, 0x01, 0x10, 0xAA, 0xBB, 0xCC, 0xDD,
];

/// OK response to RF_DISCOVER_MAP.
pub const DISCOVER_MAP_RSP: [u8; 4] = [0x41, 0x00, 0x01, 0x00];

/// Synchronous transport recording everything the engine asks of it.
#[derive(Debug, Default)]
pub struct FakeTransport {
    pub written: Vec<Bytes>,
    pub opens: usize,
    pub closes: usize,
    pub power_cycles: usize,
    pub post_inits: Vec<Bytes>,
    pub control_grants: usize,
    pub wants_pre_discover: bool,
    pub transceived: Vec<Bytes>,
    pub replies: VecDeque<io::Result<Bytes>>,
}

impl FakeTransport {
    /// Take the packets written since the last call.
    pub fn take_written(&mut self) -> Vec<Bytes> { std::mem::take(&mut self.written) }
}

impl Transport for FakeTransport {
    fn open(&mut self) -> io::Result<()> {
        self.opens += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closes += 1;
        Ok(())
    }

    fn write(&mut self, packet: &[u8]) -> io::Result<()> {
        self.written.push(Bytes::copy_from_slice(packet));
        Ok(())
    }

    fn core_initialized(&mut self, init_rsp: &[u8]) -> io::Result<()> {
        self.post_inits.push(Bytes::copy_from_slice(init_rsp));
        Ok(())
    }

    fn pre_discover(&mut self) -> bool { self.wants_pre_discover }

    fn control_granted(&mut self) { self.control_grants += 1; }

    fn power_cycle(&mut self) -> io::Result<()> {
        self.power_cycles += 1;
        Ok(())
    }

    fn transceive(&mut self, packet: &[u8]) -> io::Result<Bytes> {
        self.transceived.push(Bytes::copy_from_slice(packet));
        self.replies
            .pop_front()
            .unwrap_or_else(|| Err(io::Error::new(io::ErrorKind::TimedOut, "no scripted reply")))
    }
}

/// Events captured from the hooks and connection callbacks.
#[derive(Clone, Default)]
pub struct Recorded {
    pub responses: Arc<Mutex<Vec<ResponseEvent>>>,
    pub discovers: Arc<Mutex<Vec<DiscoverEvent>>>,
    pub conn_events: Arc<Mutex<Vec<(ConnId, ConnEvent)>>>,
}

impl Recorded {
    pub fn hooks(&self) -> Hooks {
        let responses = Arc::clone(&self.responses);
        let discovers = Arc::clone(&self.discovers);
        Hooks {
            on_response: Some(Box::new(move |event| {
                responses.lock().expect("responses lock").push(event);
            })),
            on_discover: Some(Box::new(move |event| {
                discovers.lock().expect("discovers lock").push(event);
            })),
        }
    }

    pub fn conn_callback(&self) -> ConnCallback {
        let events = Arc::clone(&self.conn_events);
        Arc::new(move |id, event| events.lock().expect("conn lock").push((id, event)))
    }

    pub fn take_responses(&self) -> Vec<ResponseEvent> {
        std::mem::take(&mut *self.responses.lock().expect("responses lock"))
    }

    pub fn take_discovers(&self) -> Vec<DiscoverEvent> {
        std::mem::take(&mut *self.discovers.lock().expect("discovers lock"))
    }

    pub fn take_conn_events(&self) -> Vec<(ConnId, ConnEvent)> {
        std::mem::take(&mut *self.conn_events.lock().expect("conn lock"))
    }
}

/// Engine over a [`FakeTransport`] with every hook recorded.
pub fn engine(config: NciConfig) -> (Engine<FakeTransport>, Recorded) {
    let recorded = Recorded::default();
    let engine = Engine::new(FakeTransport::default(), config, recorded.hooks());
    (engine, recorded)
}

/// Engine taken through the whole enable sequence, with the default
/// discovery map answered and every record cleared.
pub fn enabled_engine(config: NciConfig) -> (Engine<FakeTransport>, Recorded) {
    let (mut engine, recorded) = engine(config);
    engine.set_static_rf_callback(Some(recorded.conn_callback()));
    engine.enable().expect("enable");
    engine.on_hal_event(HalEvent::OpenComplete(Status::OK));
    engine.on_bytes(&RESET_RSP);
    engine.on_bytes(&INIT_RSP);
    engine.on_hal_event(HalEvent::PostInitComplete(Status::OK));
    engine.on_bytes(&DISCOVER_MAP_RSP);
    engine.transport_mut().take_written();
    recorded.take_responses();
    recorded.take_discovers();
    recorded.take_conn_events();
    (engine, recorded)
}

/// RF_INTF_ACTIVATED notification for the given protocol and interface.
pub fn activated_ntf(protocol: u8, interface: u8, max_payload: u8, credits: u8) -> Vec<u8> {
    vec![
        0x61, 0x05, 0x0A, 0x01, interface, protocol, 0x00, max_payload, credits, 0x00, 0x00, 0x01,
        0x01,
    ]
}
