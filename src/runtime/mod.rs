//! Async driver for an [`Engine`](crate::engine::Engine).
//!
//! [`EngineActor`] owns the engine on a single task. Upstream requests come
//! in through cloneable [`NciHandle`]s, transport completions and inbound
//! bytes through a [`TransportSink`], and the actor sleeps until the engine's
//! next timer deadline in between. Every input is applied with exclusive
//! access, so the engine itself needs no locking.
//!
//! ```no_run
//! # use ncilink::{config::NciConfig, engine::Engine, hooks::Hooks, runtime::{EngineActor, TransportSink}};
//! # use tokio_util::sync::CancellationToken;
//! # async fn demo<T: ncilink::transport::Transport>(make_transport: impl FnOnce(TransportSink) -> T) {
//! let (sink, inbound) = TransportSink::channel();
//! let engine = Engine::new(make_transport(sink), NciConfig::default(), Hooks::default());
//! let shutdown = CancellationToken::new();
//! let (actor, handle) = EngineActor::new(engine, inbound, shutdown.clone());
//! let task = actor.spawn();
//! handle.enable().await.expect("enable accepted");
//! shutdown.cancel();
//! let _engine = task.await.expect("join");
//! # }
//! ```

mod actor;
mod handle;
mod sink;

pub use actor::EngineActor;
pub use handle::{NciHandle, RuntimeError};
pub use sink::{Inbound, InboundReceiver, TransportSink};
