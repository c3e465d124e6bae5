//! Capture of upstream events.

use std::sync::{Arc, Mutex, PoisonError};

use ncilink::{
    ConnCallback, ConnEvent, ConnId, DiscoverEvent, Hooks, NciCallbacks, ResponseEvent,
    VendorEvent, command::VendorCallback, hooks::VendorListener,
};

/// Records every event the engine reports, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingCallbacks {
    responses: Mutex<Vec<ResponseEvent>>,
    discovers: Mutex<Vec<DiscoverEvent>>,
    conn_events: Mutex<Vec<(ConnId, ConnEvent)>>,
    vendor_events: Mutex<Vec<VendorEvent>>,
}

fn take<T>(events: &Mutex<Vec<T>>) -> Vec<T> {
    std::mem::take(&mut *events.lock().unwrap_or_else(PoisonError::into_inner))
}

fn push<T>(events: &Mutex<Vec<T>>, event: T) {
    events
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(event);
}

impl RecordingCallbacks {
    /// Create a shared recorder.
    #[must_use]
    pub fn new() -> Arc<Self> { Arc::default() }

    /// Engine hooks feeding this recorder.
    #[must_use]
    pub fn hooks(self: &Arc<Self>) -> Hooks { Hooks::from_callbacks(self) }

    /// Connection callback feeding this recorder.
    #[must_use]
    pub fn conn_callback(self: &Arc<Self>) -> ConnCallback {
        let this = Arc::clone(self);
        Arc::new(move |id, event| push(&this.conn_events, (id, event)))
    }

    /// Vendor listener feeding this recorder.
    #[must_use]
    pub fn vendor_listener(self: &Arc<Self>) -> VendorListener {
        let this = Arc::clone(self);
        Box::new(move |event| push(&this.vendor_events, event))
    }

    /// One-shot vendor response callback feeding this recorder.
    #[must_use]
    pub fn vendor_callback(self: &Arc<Self>) -> VendorCallback {
        let this = Arc::clone(self);
        Box::new(move |event| push(&this.vendor_events, event))
    }

    /// Management results and reports recorded since the last call.
    #[must_use]
    pub fn take_responses(&self) -> Vec<ResponseEvent> { take(&self.responses) }

    /// Discovery events recorded since the last call.
    #[must_use]
    pub fn take_discovers(&self) -> Vec<DiscoverEvent> { take(&self.discovers) }

    /// Connection events recorded since the last call.
    #[must_use]
    pub fn take_conn_events(&self) -> Vec<(ConnId, ConnEvent)> { take(&self.conn_events) }

    /// Vendor events recorded since the last call.
    #[must_use]
    pub fn take_vendor_events(&self) -> Vec<VendorEvent> { take(&self.vendor_events) }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        take(&self.responses);
        take(&self.discovers);
        take(&self.conn_events);
        take(&self.vendor_events);
    }
}

impl NciCallbacks for RecordingCallbacks {
    fn on_response(&self, event: ResponseEvent) { push(&self.responses, event); }

    fn on_discover(&self, event: DiscoverEvent) { push(&self.discovers, event); }
}
