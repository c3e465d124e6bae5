//! A [`Transport`] that answers from a script.

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex, MutexGuard},
};

use bytes::Bytes;
use ncilink::{HalEvent, TransportSink, transport::Transport};

/// Everything the engine has asked of a [`ScriptedTransport`].
#[derive(Debug, Default)]
pub struct ControllerLog {
    /// Packets passed to `write`, oldest first.
    pub written: Vec<Bytes>,
    /// Packets passed to `transceive`.
    pub transceived: Vec<Bytes>,
    /// CORE_INIT payloads handed over for post-initialisation.
    pub post_inits: Vec<Bytes>,
    /// Number of `open` calls.
    pub opens: usize,
    /// Number of `close` calls.
    pub closes: usize,
    /// Number of `power_cycle` calls.
    pub power_cycles: usize,
    /// Number of channel hand-overs.
    pub control_grants: usize,
}

type Responder = Box<dyn FnMut(&[u8]) -> Option<Bytes> + Send>;

#[derive(Default)]
struct Shared {
    log: ControllerLog,
    replies: VecDeque<io::Result<Bytes>>,
    pre_discover: bool,
}

/// Transport double shared between the engine and the test body.
///
/// Clones see the same log. Without a sink every completion is left to the
/// test; with one ([`ScriptedTransport::with_sink`]), open, close, power cycle
/// and post-initialisation complete immediately and `write` forwards the
/// responder's answer as inbound bytes.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    shared: Arc<Mutex<Shared>>,
    sink: Option<TransportSink>,
    responder: Option<Arc<Mutex<Responder>>>,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("live", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl ScriptedTransport {
    /// Create a transport whose completions the test delivers by hand.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create a transport that completes through `sink` and answers writes
    /// with `responder`.
    #[must_use]
    pub fn with_sink<F>(sink: TransportSink, responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Option<Bytes> + Send + 'static,
    {
        Self {
            shared: Arc::default(),
            sink: Some(sink),
            responder: Some(Arc::new(Mutex::new(Box::new(responder)))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Inspect the log.
    pub fn with_log<R>(&self, f: impl FnOnce(&ControllerLog) -> R) -> R { f(&self.lock().log) }

    /// Take the packets written since the last call.
    #[must_use]
    pub fn take_written(&self) -> Vec<Bytes> { std::mem::take(&mut self.lock().log.written) }

    /// Packets written so far, as plain vectors, without clearing them.
    #[must_use]
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.lock().log.written.iter().map(|p| p.to_vec()).collect()
    }

    /// Queue the answer to the next `transceive`.
    pub fn push_reply(&self, reply: io::Result<Bytes>) { self.lock().replies.push_back(reply); }

    /// Decide what `pre_discover` answers.
    pub fn set_pre_discover(&self, wanted: bool) { self.lock().pre_discover = wanted; }

    fn complete(&self, event: HalEvent) {
        if let Some(sink) = &self.sink {
            sink.hal_event(event);
        }
    }
}

impl Transport for ScriptedTransport {
    fn open(&mut self) -> io::Result<()> {
        self.lock().log.opens += 1;
        self.complete(HalEvent::OpenComplete(ncilink::Status::OK));
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.lock().log.closes += 1;
        self.complete(HalEvent::CloseComplete(ncilink::Status::OK));
        Ok(())
    }

    fn write(&mut self, packet: &[u8]) -> io::Result<()> {
        self.lock().log.written.push(Bytes::copy_from_slice(packet));
        if let (Some(sink), Some(responder)) = (&self.sink, &self.responder) {
            let reply = {
                let mut responder = responder
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                responder(packet)
            };
            if let Some(reply) = reply {
                sink.bytes(reply);
            }
        }
        Ok(())
    }

    fn core_initialized(&mut self, init_rsp: &[u8]) -> io::Result<()> {
        self.lock().log.post_inits.push(Bytes::copy_from_slice(init_rsp));
        self.complete(HalEvent::PostInitComplete(ncilink::Status::OK));
        Ok(())
    }

    fn pre_discover(&mut self) -> bool { self.lock().pre_discover }

    fn control_granted(&mut self) { self.lock().log.control_grants += 1; }

    fn power_cycle(&mut self) -> io::Result<()> {
        self.lock().log.power_cycles += 1;
        self.complete(HalEvent::OpenComplete(ncilink::Status::OK));
        Ok(())
    }

    fn transceive(&mut self, packet: &[u8]) -> io::Result<Bytes> {
        let mut shared = self.lock();
        shared.log.transceived.push(Bytes::copy_from_slice(packet));
        shared
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(io::Error::new(io::ErrorKind::TimedOut, "no scripted reply")))
    }
}
