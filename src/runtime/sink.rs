//! Channel carrying transport completions into the actor.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::transport::HalEvent;

/// Input produced by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inbound {
    /// A lifecycle notification.
    Hal(HalEvent),
    /// Bytes read from the controller.
    Bytes(Bytes),
}

/// Receiving half handed to [`EngineActor::new`](super::EngineActor::new).
pub type InboundReceiver = mpsc::UnboundedReceiver<Inbound>;

/// Cloneable sender used by a [`Transport`](crate::transport::Transport)
/// implementation to report completions.
///
/// Sending never blocks, so it is safe to call from a driver thread or from
/// inside a transport method the engine is currently running.
#[derive(Clone, Debug)]
pub struct TransportSink {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl TransportSink {
    /// Create a sink and the receiver the actor drains.
    #[must_use]
    pub fn channel() -> (Self, InboundReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Report a lifecycle event. Returns `false` once the actor has stopped.
    pub fn hal_event(&self, event: HalEvent) -> bool { self.tx.send(Inbound::Hal(event)).is_ok() }

    /// Deliver bytes read from the controller. Returns `false` once the actor
    /// has stopped.
    pub fn bytes(&self, data: impl Into<Bytes>) -> bool {
        self.tx.send(Inbound::Bytes(data.into())).is_ok()
    }

    /// Whether the actor has stopped listening.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.tx.is_closed() }
}
