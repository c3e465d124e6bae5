//! Per-connection control block.

use std::{collections::VecDeque, fmt, sync::Arc};

use bytes::Bytes;

use super::{ConnId, guard::OpenConnection};
use crate::{data::RxQueue, event::ConnEvent};

/// Credit value meaning "no flow control"; never decremented.
pub const UNLIMITED_CREDITS: u8 = 0xFF;

/// Owner callback receiving every event for one connection.
pub type ConnCallback = Arc<dyn Fn(ConnId, ConnEvent) + Send + Sync + 'static>;

/// What a logical connection talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnKind {
    /// The static RF connection (id 0).
    Rf,
    /// Loopback connection inside the controller.
    Loopback,
    /// A remote endpoint discovered over RF.
    Remote {
        /// RF discovery id of the endpoint.
        rf_disc_id: u8,
    },
    /// An NFC execution environment.
    Nfcee {
        /// NFCEE id.
        nfcee_id: u8,
        /// NFCEE interface protocol.
        protocol: u8,
    },
}

/// Queues, credits and identifiers of one logical connection.
pub struct ControlBlock {
    pub(crate) id: ConnId,
    pub(crate) kind: ConnKind,
    pub(crate) protocol: u8,
    pub(crate) interface: u8,
    pub(crate) max_payload: u8,
    pub(crate) init_credits: u8,
    pub(crate) credits: u8,
    pub(crate) tx: VecDeque<Bytes>,
    pub(crate) rx: RxQueue,
    pub(crate) callback: Option<ConnCallback>,
    _open: OpenConnection,
}

impl ControlBlock {
    pub(super) fn new(kind: ConnKind, callback: Option<ConnCallback>) -> Self {
        Self {
            id: ConnId::PENDING,
            kind,
            protocol: 0,
            interface: 0,
            max_payload: 0,
            init_credits: 0,
            credits: 0,
            tx: VecDeque::new(),
            rx: RxQueue::default(),
            callback,
            _open: OpenConnection::new(),
        }
    }

    /// Assigned connection id, or [`ConnId::PENDING`].
    #[must_use]
    pub const fn id(&self) -> ConnId { self.id }

    /// Destination of the connection.
    #[must_use]
    pub const fn kind(&self) -> ConnKind { self.kind }

    /// Active RF or NFCEE protocol.
    #[must_use]
    pub const fn protocol(&self) -> u8 { self.protocol }

    /// Largest data payload the controller accepts per packet.
    #[must_use]
    pub const fn max_payload(&self) -> u8 { self.max_payload }

    /// Credits granted when the connection was set up.
    #[must_use]
    pub const fn initial_credits(&self) -> u8 { self.init_credits }

    /// Credits currently available for sending.
    #[must_use]
    pub const fn credits(&self) -> u8 { self.credits }

    /// Whether flow control is disabled for this connection.
    #[must_use]
    pub const fn is_unlimited(&self) -> bool { self.init_credits == UNLIMITED_CREDITS }

    /// Number of buffers waiting to be sent.
    #[must_use]
    pub fn queued_tx(&self) -> usize { self.tx.len() }

    /// Set the negotiated payload size and credit allotment.
    pub(crate) fn configure(&mut self, max_payload: u8, credits: u8) {
        self.max_payload = max_payload;
        self.init_credits = credits;
        self.credits = credits;
    }

    /// Add returned credits, never exceeding the initial allotment.
    ///
    /// Returns `true` if the delta had to be clamped.
    pub(crate) fn add_credits(&mut self, delta: u8) -> bool {
        if self.is_unlimited() {
            return false;
        }
        let sum = self.credits.saturating_add(delta);
        self.credits = sum.min(self.init_credits);
        sum > self.init_credits
    }

    /// Take one credit for an outgoing segment.
    pub(crate) fn consume_credit(&mut self) {
        if !self.is_unlimited() {
            self.credits = self.credits.saturating_sub(1);
        }
    }

    /// Deliver an event to the owner, if one is registered.
    pub(crate) fn notify(&self, event: ConnEvent) {
        if let Some(callback) = &self.callback {
            callback(self.id, event);
        }
    }

    /// Discard both queues, returning how many buffers were dropped.
    pub(crate) fn flush(&mut self) -> usize {
        let dropped = self.tx.len() + self.rx.len();
        self.tx.clear();
        self.rx.clear();
        dropped
    }
}

impl fmt::Debug for ControlBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlBlock")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("max_payload", &self.max_payload)
            .field("init_credits", &self.init_credits)
            .field("credits", &self.credits)
            .field("tx", &self.tx.len())
            .field("rx", &self.rx.len())
            .finish_non_exhaustive()
    }
}
