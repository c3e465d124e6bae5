//! Task owning the engine.

use std::{any::Any, panic::AssertUnwindSafe};

use futures::FutureExt;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;

use super::{
    InboundReceiver,
    handle::{Job, NciHandle},
    sink::Inbound,
};
use crate::{engine::Engine, transport::Transport};

/// Actor serialising every input to one [`Engine`].
///
/// Inputs are taken in priority order: shutdown, expired timers, transport
/// completions and finally upstream requests.
pub struct EngineActor<T: Transport> {
    engine: Engine<T>,
    requests: mpsc::Receiver<Job<T>>,
    inbound: InboundReceiver,
    shutdown: CancellationToken,
}

impl<T: Transport> EngineActor<T> {
    /// Wrap `engine`, returning the actor and the first handle to it.
    ///
    /// The request mailbox holds `mailbox_capacity` entries from the engine
    /// configuration.
    #[must_use]
    pub fn new(
        engine: Engine<T>,
        inbound: InboundReceiver,
        shutdown: CancellationToken,
    ) -> (Self, NciHandle<T>) {
        let (tx, requests) = mpsc::channel(engine.config.mailbox_capacity);
        let actor = Self {
            engine,
            requests,
            inbound,
            shutdown,
        };
        (actor, NciHandle::new(tx))
    }

    /// Run until shutdown is requested or every handle has been dropped.
    ///
    /// Returns the engine so its final state can be inspected.
    pub async fn run(mut self) -> Engine<T> {
        tracing::debug!(state = %self.engine.state(), "engine actor started");
        let mut inbound_open = true;
        loop {
            let deadline = self.engine.next_deadline();
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => {
                    tracing::info!("engine actor shutting down");
                    break;
                }

                () = wait_for(deadline) => self.engine.on_tick(Instant::now()),

                input = self.inbound.recv(), if inbound_open => match input {
                    Some(Inbound::Hal(event)) => self.engine.on_hal_event(event),
                    Some(Inbound::Bytes(bytes)) => self.engine.on_bytes(&bytes),
                    None => {
                        tracing::warn!("transport sink dropped");
                        inbound_open = false;
                    }
                },

                job = self.requests.recv() => match job {
                    Some(job) => job(&mut self.engine),
                    None => {
                        tracing::debug!("all handles dropped");
                        break;
                    }
                },
            }
        }
        tracing::debug!(state = %self.engine.state(), "engine actor stopped");
        self.engine
    }

    /// Spawn [`EngineActor::run`] on the current runtime.
    ///
    /// A panic inside a hook or the transport ends the task; it is logged and
    /// the join handle yields `None`.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<Option<Engine<T>>> {
        tokio::spawn(async move {
            match AssertUnwindSafe(self.run()).catch_unwind().await {
                Ok(engine) => Some(engine),
                Err(panic) => {
                    tracing::error!(panic = %panic_message(panic.as_ref()), "engine actor panicked");
                    None
                }
            }
        })
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}
