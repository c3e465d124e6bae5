//! The transport engine context.
//!
//! [`Engine`] owns every piece of protocol state: the command window, the
//! connection table, both timer lists and the protocol state itself. All
//! entry points take `&mut self`, so a single owner (usually the
//! [`EngineActor`](crate::runtime::EngineActor)) serialises upstream calls,
//! transport events, inbound bytes and timer ticks without any lock.
//!
//! The implementation is split by concern: `api` holds the management
//! requests, `lifecycle` the enable/disable/power sequencing, `data_path`
//! the send and receive side of logical connections and `recovery` the
//! timer expiry handling. Inbound control packets are dispatched by
//! the `router` module.

mod api;
mod data_path;
mod lifecycle;
mod recovery;

use std::{fmt, time::Duration};

use bytes::Bytes;
use log::{debug, error, info};
use tokio::time::Instant;

use crate::{
    codec::{self, Gid, MessageType},
    command::CommandChannel,
    config::{NciConfig, TraceLevel, VENDOR_CALLBACK_SLOTS},
    conn::{ConnCallback, ConnId, ConnTable, ControlBlock},
    error::{NciError, Result},
    event::{DeactivateType, DiscoverEvent, NfccCapabilities, ResponseEvent},
    hooks::{Hooks, VendorListener},
    metrics::{self, Direction},
    state::{NfcState, StateFlags},
    timer::{TimerKind, TimerList},
    transport::Transport,
};

/// Hex rendering of a packet for traces.
pub(crate) struct Hex<'a>(pub(crate) &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, byte) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Owned context of one host/controller channel.
pub struct Engine<T: Transport> {
    pub(crate) transport: T,
    pub(crate) config: NciConfig,
    pub(crate) hooks: Hooks,
    pub(crate) state: NfcState,
    pub(crate) flags: StateFlags,
    pub(crate) channel: CommandChannel,
    pub(crate) conns: ConnTable,
    pub(crate) timers: TimerList,
    pub(crate) quick_timers: TimerList,
    pub(crate) capabilities: Option<NfccCapabilities>,
    pub(crate) nci_version: u8,
    pub(crate) init_rsp: Option<Bytes>,
    pub(crate) vendor_listeners: [Option<VendorListener>; VENDOR_CALLBACK_SLOTS],
    pub(crate) rf_callback: Option<ConnCallback>,
    pub(crate) reassembly: bool,
    pub(crate) trace_level: TraceLevel,
    pub(crate) max_routing_table_size: u16,
    pub(crate) deferred_deactivate: Option<DeactivateType>,
}

impl<T: Transport> Engine<T> {
    /// Create an engine in the uninitialised state.
    ///
    /// `config` is normalised and read once; later changes go through the
    /// runtime setters such as [`Engine::set_trace_level`].
    #[must_use]
    pub fn new(transport: T, config: NciConfig, hooks: Hooks) -> Self {
        let config = config.normalized();
        Self {
            transport,
            conns: ConnTable::new(config.max_connections),
            reassembly: config.reassembly_enabled,
            trace_level: config.trace_level,
            max_routing_table_size: config.max_routing_table_size,
            config,
            hooks,
            state: NfcState::Uninitialized,
            flags: StateFlags::default(),
            channel: CommandChannel::new(),
            timers: TimerList::new(),
            quick_timers: TimerList::new(),
            capabilities: None,
            nci_version: 0,
            init_rsp: None,
            vendor_listeners: std::array::from_fn(|_| None),
            rf_callback: None,
            deferred_deactivate: None,
        }
    }

    /// Current protocol state.
    #[must_use]
    pub const fn state(&self) -> NfcState { self.state }

    /// Secondary state flags.
    #[must_use]
    pub const fn flags(&self) -> StateFlags { self.flags }

    /// Controller capabilities, once enabling has parsed them.
    #[must_use]
    pub fn capabilities(&self) -> Option<&NfccCapabilities> { self.capabilities.as_ref() }

    /// NCI version reported by the last CORE_RESET.
    #[must_use]
    pub const fn nci_version(&self) -> u8 { self.nci_version }

    /// Routing table capacity in bytes.
    #[must_use]
    pub const fn max_routing_table_size(&self) -> u16 { self.max_routing_table_size }

    /// Current protocol trace level.
    #[must_use]
    pub const fn trace_level(&self) -> TraceLevel { self.trace_level }

    /// Free command window slots.
    #[must_use]
    pub const fn command_window(&self) -> u8 { self.channel.window() }

    /// Commands waiting for the window.
    #[must_use]
    pub fn queued_commands(&self) -> usize { self.channel.queued() }

    /// Control block bound to `id`, if any.
    #[must_use]
    pub fn connection(&self, id: ConnId) -> Option<&ControlBlock> {
        self.conns.find_by_id(id).and_then(|handle| self.conns.get(handle))
    }

    /// Earliest deadline across both timer lists.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.timers.next_deadline(), self.quick_timers.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Borrow the transport.
    #[must_use]
    pub fn transport(&self) -> &T { &self.transport }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T { &mut self.transport }

    pub(crate) fn set_state(&mut self, next: NfcState) {
        if self.state != next {
            info!("{} -> {}", self.state, next);
            self.state = next;
        }
    }

    pub(crate) fn require_enabled(&self) -> Result<()> {
        if self.state.is_enabled() {
            Ok(())
        } else {
            Err(NciError::NotInitialized(self.state))
        }
    }

    pub(crate) fn api_trace(&self, call: &str) {
        if self.trace_level.allows(TraceLevel::Api) {
            info!("{call} (state {})", self.state);
        }
    }

    pub(crate) fn respond(&mut self, event: ResponseEvent) {
        debug!("response event: {event:?}");
        self.hooks.response(event);
    }

    pub(crate) fn discover(&mut self, event: DiscoverEvent) {
        debug!("discover event: {event:?}");
        self.hooks.discover(event);
    }

    pub(crate) fn start_timer(&mut self, kind: TimerKind, after: Duration) {
        let deadline = Instant::now() + after;
        match kind {
            TimerKind::Quick(_) => self.quick_timers.start(kind, deadline),
            _ => self.timers.start(kind, deadline),
        }
    }

    /// Hand one encoded packet to the transport.
    ///
    /// A failed write is logged; for commands the response timer then drives
    /// recovery.
    pub(crate) fn write_packet(&mut self, packet: &[u8], kind: MessageType) {
        if self.trace_level.allows(TraceLevel::Debug) {
            debug!("tx {}: {}", kind.as_str(), Hex(packet));
        }
        metrics::inc_frames(Direction::Outbound, kind);
        if let Err(err) = self.transport.write(packet) {
            error!("transport write failed: {err}");
        }
    }

    /// Encode and queue a command, sending it at once if the window allows.
    pub(crate) fn send_command(&mut self, gid: Gid, oid: u8, payload: impl Into<Bytes>) -> Result<()> {
        let packet = codec::command(gid, oid, payload)?;
        self.channel.enqueue(packet, None);
        self.check_cmd_queue();
        Ok(())
    }

    /// Transmit the next queued command if the window is open, or hand the
    /// channel to the transport when it asked for it.
    pub(crate) fn check_cmd_queue(&mut self) {
        if self.flags.transport_has_control {
            return;
        }
        if let Some(packet) = self.channel.pop_ready() {
            if let Some(last) = self.channel.last_sent() {
                debug!("sending {}", codec::opcode::name(last.gid(), last.oid()));
            }
            self.write_packet(&packet, MessageType::Command);
            self.start_timer(TimerKind::CommandResponse, self.config.command_timeout);
            return;
        }
        if !self.channel.is_open() || !self.flags.control_requested {
            return;
        }
        self.flags.control_requested = false;
        if self.flags.discover_pending {
            if self.transport.pre_discover() {
                debug!("transport runs pre-discovery");
                self.flags.transport_has_control = true;
                self.channel.hand_over();
            } else {
                self.flags.discover_pending = false;
                self.send_pending_discovery();
            }
        } else if self.flags.hal_requested {
            debug!("handing the command channel to the transport");
            self.flags.hal_requested = false;
            self.flags.transport_has_control = true;
            self.channel.hand_over();
            self.transport.control_granted();
        }
    }

    pub(crate) fn send_pending_discovery(&mut self) {
        if let Some(packet) = self.channel.take_pending_discovery() {
            self.channel.enqueue_front(packet);
            self.check_cmd_queue();
        }
    }
}

impl<T: Transport> fmt::Debug for Engine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("flags", &self.flags)
            .field("channel", &self.channel)
            .field("conns", &self.conns)
            .field("timers", &self.timers)
            .finish_non_exhaustive()
    }
}
