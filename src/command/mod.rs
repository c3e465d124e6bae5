//! Single-slot command window.
//!
//! The controller accepts one command at a time. [`CommandChannel`] queues
//! encoded commands while the window is closed, remembers the header of the
//! command in flight so its response can be verified, and carries the pending
//! vendor request whose callback completes with that response. The engine
//! owns transmission and the response timer; this type only decides what may
//! go out next.

mod snapshot;

use std::{collections::VecDeque, fmt};

use bytes::Bytes;
use log::error;
pub use snapshot::HeaderSnapshot;

use crate::event::VendorEvent;

/// Commands the controller may have outstanding at once.
pub const MAX_WINDOW: u8 = 1;

/// Callback completing a proprietary command.
pub type VendorCallback = Box<dyn FnOnce(VendorEvent) + Send + 'static>;

/// Proprietary command waiting for its response.
pub struct PendingVendor {
    oid: u8,
    callback: VendorCallback,
}

impl PendingVendor {
    /// Attach `callback` to the proprietary command `oid`.
    #[must_use]
    pub fn new(oid: u8, callback: VendorCallback) -> Self { Self { oid, callback } }

    /// Proprietary opcode of the command.
    #[must_use]
    pub const fn oid(&self) -> u8 { self.oid }

    /// Deliver the response, consuming the request.
    pub fn complete(self, event: VendorEvent) { (self.callback)(event); }
}

impl fmt::Debug for PendingVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingVendor")
            .field("oid", &self.oid)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct QueuedCommand {
    packet: Bytes,
    vendor: Option<PendingVendor>,
}

/// Command window, queue and last-sent memory.
#[derive(Debug)]
pub struct CommandChannel {
    window: u8,
    queue: VecDeque<QueuedCommand>,
    last: Option<HeaderSnapshot>,
    vendor: Option<PendingVendor>,
    pending_discovery: Option<Bytes>,
    last_discovery: Option<Bytes>,
}

impl Default for CommandChannel {
    fn default() -> Self { Self::new() }
}

impl CommandChannel {
    /// Create a channel with the window open and nothing queued.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            window: MAX_WINDOW,
            queue: VecDeque::new(),
            last: None,
            vendor: None,
            pending_discovery: None,
            last_discovery: None,
        }
    }

    /// Free slots in the window.
    #[must_use]
    pub const fn window(&self) -> u8 { self.window }

    /// Whether the window is fully open.
    #[must_use]
    pub const fn is_open(&self) -> bool { self.window == MAX_WINDOW }

    /// Number of commands waiting for the window.
    #[must_use]
    pub fn queued(&self) -> usize { self.queue.len() }

    /// Snapshot of the command in flight.
    #[must_use]
    pub fn last_sent(&self) -> Option<&HeaderSnapshot> { self.last.as_ref() }

    /// Whether a proprietary command is waiting for its response.
    #[must_use]
    pub const fn has_pending_vendor(&self) -> bool { self.vendor.is_some() }

    /// Append an encoded command, optionally carrying a vendor callback.
    pub fn enqueue(&mut self, packet: Bytes, vendor: Option<PendingVendor>) {
        self.queue.push_back(QueuedCommand { packet, vendor });
    }

    /// Put an encoded command ahead of everything already queued.
    pub fn enqueue_front(&mut self, packet: Bytes) {
        self.queue.push_front(QueuedCommand {
            packet,
            vendor: None,
        });
    }

    /// Take the next command if the window has room.
    ///
    /// The returned packet is in flight from this moment: the window is
    /// decremented, its header recorded and its vendor callback made
    /// pending. The caller must write it and start the response timer.
    pub fn pop_ready(&mut self) -> Option<Bytes> {
        while self.window > 0 {
            let QueuedCommand { packet, vendor } = self.queue.pop_front()?;
            match HeaderSnapshot::capture(&packet) {
                Ok(snapshot) => {
                    self.last = Some(snapshot);
                    self.vendor = vendor;
                    self.window -= 1;
                    return Some(packet);
                }
                Err(err) => error!("dropping malformed queued command: {err}"),
            }
        }
        None
    }

    /// Give back the slot held by the command in flight.
    ///
    /// Clears the snapshot and any vendor callback that was not consumed.
    /// Returns `false`, changing nothing, if the window was already open.
    pub fn release(&mut self) -> bool {
        if self.window >= MAX_WINDOW {
            return false;
        }
        self.window += 1;
        self.last = None;
        self.vendor = None;
        true
    }

    /// Take the pending vendor callback so it can be completed.
    pub fn take_vendor(&mut self) -> Option<PendingVendor> { self.vendor.take() }

    /// Close the window while the transport owns the channel.
    pub fn hand_over(&mut self) { self.window = 0; }

    /// Reopen the window once the transport returns the channel.
    pub fn reclaim(&mut self) { self.window = MAX_WINDOW; }

    /// Remove and return the snapshot of the command in flight.
    pub fn take_last(&mut self) -> Option<HeaderSnapshot> { self.last.take() }

    /// Drop every queued command and reopen the window.
    ///
    /// Returns the number of commands discarded. Discovery memory survives so
    /// recovery can re-issue the last discovery.
    pub fn reset(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        self.window = MAX_WINDOW;
        self.last = None;
        self.vendor = None;
        self.pending_discovery = None;
        dropped
    }

    /// Park an RF_DISCOVER packet until the channel is handed back.
    pub fn set_pending_discovery(&mut self, packet: Bytes) { self.pending_discovery = Some(packet); }

    /// Whether a discovery start is parked.
    #[must_use]
    pub const fn has_pending_discovery(&self) -> bool { self.pending_discovery.is_some() }

    /// Release the parked RF_DISCOVER packet, remembering it as the last
    /// discovery.
    pub fn take_pending_discovery(&mut self) -> Option<Bytes> {
        let packet = self.pending_discovery.take()?;
        self.last_discovery = Some(packet.clone());
        Some(packet)
    }

    /// The most recent RF_DISCOVER packet sent.
    #[must_use]
    pub fn last_discovery(&self) -> Option<&Bytes> { self.last_discovery.as_ref() }

    /// Forget the last discovery, once RF returns to idle through a
    /// deactivate.
    pub fn clear_last_discovery(&mut self) { self.last_discovery = None; }
}
