//! Upstream callbacks invoked by the engine.
//!
//! [`Hooks`] stores optional boxed closures the engine calls as management
//! and discovery events complete, while [`NciCallbacks`] is the trait
//! embedders implement when a single object should receive both streams.

use std::sync::Arc;

use crate::event::{DiscoverEvent, ResponseEvent, VendorEvent};

/// Trait receiving asynchronous engine events.
///
/// Both methods default to no-ops so an implementation only overrides what it
/// cares about.
pub trait NciCallbacks: Send + Sync + 'static {
    /// Called for management results and controller reports.
    fn on_response(&self, _event: ResponseEvent) {}

    /// Called for discovery results.
    fn on_discover(&self, _event: DiscoverEvent) {}
}

/// Type alias for the response callback.
type ResponseHook = Box<dyn FnMut(ResponseEvent) + Send + 'static>;

/// Type alias for the discovery callback.
type DiscoverHook = Box<dyn FnMut(DiscoverEvent) + Send + 'static>;

/// Listener registered in one of the fixed vendor slots; receives every
/// proprietary notification.
pub type VendorListener = Box<dyn FnMut(VendorEvent) + Send + 'static>;

/// Callbacks used by the engine.
#[derive(Default)]
pub struct Hooks {
    /// Invoked with every [`ResponseEvent`].
    pub on_response: Option<ResponseHook>,
    /// Invoked with every [`DiscoverEvent`].
    pub on_discover: Option<DiscoverHook>,
}

impl Hooks {
    /// Run the response hook if registered.
    pub fn response(&mut self, event: ResponseEvent) {
        if let Some(hook) = &mut self.on_response {
            hook(event);
        }
    }

    /// Run the discovery hook if registered.
    pub fn discover(&mut self, event: DiscoverEvent) {
        if let Some(hook) = &mut self.on_discover {
            hook(event);
        }
    }

    /// Construct hooks from an [`NciCallbacks`] implementation.
    pub fn from_callbacks<P>(callbacks: &Arc<P>) -> Self
    where
        P: NciCallbacks + ?Sized,
    {
        let on_response = Arc::clone(callbacks);
        let response =
            Box::new(move |event: ResponseEvent| on_response.on_response(event)) as ResponseHook;

        let on_discover = Arc::clone(callbacks);
        let discover =
            Box::new(move |event: DiscoverEvent| on_discover.on_discover(event)) as DiscoverHook;

        Self {
            on_response: Some(response),
            on_discover: Some(discover),
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("on_response", &self.on_response.is_some())
            .field("on_discover", &self.on_discover.is_some())
            .finish()
    }
}
