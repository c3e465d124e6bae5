//! Cloneable request side of the actor.

use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::{
    command::VendorCallback,
    config::TraceLevel,
    conn::{ConnCallback, ConnHandle, ConnId, ConnKind},
    engine::Engine,
    error::NciError,
    event::DeactivateType,
    hooks::VendorListener,
    params::{DiscoverMap, DiscoverParam},
    state::NfcState,
    transport::Transport,
};

/// Closure run by the actor with exclusive access to the engine.
pub(super) type Job<T> = Box<dyn FnOnce(&mut Engine<T>) + Send + 'static>;

/// Failure of a request made through an [`NciHandle`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The actor has stopped.
    #[error("engine actor is not running")]
    Closed,
    /// The engine rejected the request.
    #[error(transparent)]
    Engine(#[from] NciError),
}

/// Handle used by upper layers to issue requests to a running engine.
///
/// Each method resolves once the actor has applied the request, with the
/// synchronous outcome; later completions still arrive through the hooks.
pub struct NciHandle<T: Transport> {
    tx: mpsc::Sender<Job<T>>,
}

impl<T: Transport> Clone for NciHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Transport> std::fmt::Debug for NciHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NciHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl<T: Transport> NciHandle<T> {
    pub(super) fn new(tx: mpsc::Sender<Job<T>>) -> Self { Self { tx } }

    /// Run `f` against the engine on the actor task and return its result.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Closed`] if the actor has stopped before or
    /// while handling the request.
    pub async fn call<R, F>(&self, f: F) -> Result<R, RuntimeError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Engine<T>) -> R + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let job: Job<T> = Box::new(move |engine| {
            // The caller may have given up waiting.
            let _ = reply.send(f(engine));
        });
        self.tx.send(job).await.map_err(|_| RuntimeError::Closed)?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    async fn request<R, F>(&self, f: F) -> Result<R, RuntimeError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Engine<T>) -> crate::error::Result<R> + Send + 'static,
    {
        Ok(self.call(f).await??)
    }

    /// Whether the actor has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.tx.is_closed() }

    /// Current protocol state.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Closed`] if the actor has stopped.
    pub async fn state(&self) -> Result<NfcState, RuntimeError> { self.call(|e: &mut Engine<T>| e.state()).await }

    /// See [`Engine::enable`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn enable(&self) -> Result<(), RuntimeError> { self.request(Engine::enable).await }

    /// See [`Engine::disable`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn disable(&self) -> Result<(), RuntimeError> { self.request(Engine::disable).await }

    /// See [`Engine::set_power_off_sleep`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn set_power_off_sleep(&self, enter: bool) -> Result<(), RuntimeError> {
        self.request(move |e| e.set_power_off_sleep(enter)).await
    }

    /// See [`Engine::power_cycle`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn power_cycle(&self) -> Result<(), RuntimeError> { self.request(Engine::power_cycle).await }

    /// See [`Engine::set_config`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn set_config(&self, tlvs: Vec<u8>) -> Result<(), RuntimeError> {
        self.request(move |e| e.set_config(&tlvs)).await
    }

    /// See [`Engine::get_config`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn get_config(&self, ids: Vec<u8>) -> Result<(), RuntimeError> {
        self.request(move |e| e.get_config(&ids)).await
    }

    /// See [`Engine::discover_map`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn discover_map(&self, maps: Vec<DiscoverMap>) -> Result<(), RuntimeError> {
        self.request(move |e| e.discover_map(&maps)).await
    }

    /// See [`Engine::start_discovery`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn start_discovery(&self, params: Vec<DiscoverParam>) -> Result<(), RuntimeError> {
        self.request(move |e| e.start_discovery(&params)).await
    }

    /// See [`Engine::select`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn select(&self, rf_disc_id: u8, protocol: u8, interface: u8) -> Result<(), RuntimeError> {
        self.request(move |e| e.select(rf_disc_id, protocol, interface)).await
    }

    /// See [`Engine::deactivate`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn deactivate(&self, kind: DeactivateType) -> Result<(), RuntimeError> {
        self.request(move |e| e.deactivate(kind)).await
    }

    /// See [`Engine::conn_create`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn conn_create(
        &self,
        kind: ConnKind,
        callback: ConnCallback,
    ) -> Result<ConnHandle, RuntimeError> {
        self.request(move |e| e.conn_create(kind, callback)).await
    }

    /// See [`Engine::conn_close`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn conn_close(&self, id: ConnId) -> Result<(), RuntimeError> {
        self.request(move |e| e.conn_close(id)).await
    }

    /// See [`Engine::send_data`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn send_data(&self, id: ConnId, data: impl Into<Bytes>) -> Result<(), RuntimeError> {
        let data = data.into();
        self.request(move |e| e.send_data(id, data)).await
    }

    /// See [`Engine::flush_data`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn flush_data(&self, id: ConnId) -> Result<(), RuntimeError> {
        self.request(move |e| e.flush_data(id)).await
    }

    /// See [`Engine::send_vendor_command`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn send_vendor_command(
        &self,
        oid: u8,
        payload: impl Into<Bytes>,
        callback: VendorCallback,
    ) -> Result<(), RuntimeError> {
        let payload = payload.into();
        self.request(move |e| e.send_vendor_command(oid, payload, callback)).await
    }

    /// See [`Engine::register_vendor_callback`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn register_vendor_callback(&self, listener: VendorListener) -> Result<usize, RuntimeError> {
        self.request(move |e| e.register_vendor_callback(listener)).await
    }

    /// See [`Engine::deregister_vendor_callback`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn deregister_vendor_callback(&self, slot: usize) -> Result<(), RuntimeError> {
        self.request(move |e| e.deregister_vendor_callback(slot)).await
    }

    /// See [`Engine::t3t_polling`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn t3t_polling(
        &self,
        system_code: u16,
        request_code: u8,
        time_slot: u8,
    ) -> Result<(), RuntimeError> {
        self.request(move |e| e.t3t_polling(system_code, request_code, time_slot))
            .await
    }

    /// See [`Engine::set_routing`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn set_routing(&self, more: bool, tlvs: Vec<u8>) -> Result<(), RuntimeError> {
        self.request(move |e| e.set_routing(more, &tlvs)).await
    }

    /// See [`Engine::get_routing`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn get_routing(&self) -> Result<(), RuntimeError> { self.request(Engine::get_routing).await }

    /// See [`Engine::rf_parameter_update`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn rf_parameter_update(&self, tlvs: Vec<u8>) -> Result<(), RuntimeError> {
        self.request(move |e| e.rf_parameter_update(&tlvs)).await
    }

    /// See [`Engine::nfcee_discover`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn nfcee_discover(&self, enable: bool) -> Result<(), RuntimeError> {
        self.request(move |e| e.nfcee_discover(enable)).await
    }

    /// See [`Engine::nfcee_mode_set`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, or [`RuntimeError::Closed`].
    pub async fn nfcee_mode_set(&self, nfcee_id: u8, mode: u8) -> Result<(), RuntimeError> {
        self.request(move |e| e.nfcee_mode_set(nfcee_id, mode)).await
    }

    /// See [`Engine::start_quick_timer`].
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Closed`] if the actor has stopped.
    pub async fn start_quick_timer(&self, id: u16, after: Duration) -> Result<(), RuntimeError> {
        self.call(move |e| e.start_quick_timer(id, after)).await
    }

    /// See [`Engine::stop_quick_timer`].
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Closed`] if the actor has stopped.
    pub async fn stop_quick_timer(&self, id: u16) -> Result<bool, RuntimeError> {
        self.call(move |e| e.stop_quick_timer(id)).await
    }

    /// See [`Engine::set_reassembly`].
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Closed`] if the actor has stopped.
    pub async fn set_reassembly(&self, enabled: bool) -> Result<(), RuntimeError> {
        self.call(move |e| e.set_reassembly(enabled)).await
    }

    /// See [`Engine::set_trace_level`].
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Closed`] if the actor has stopped.
    pub async fn set_trace_level(&self, level: TraceLevel) -> Result<TraceLevel, RuntimeError> {
        self.call(move |e| e.set_trace_level(level)).await
    }

    /// See [`Engine::set_static_rf_callback`].
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Closed`] if the actor has stopped.
    pub async fn set_static_rf_callback(&self, callback: Option<ConnCallback>) -> Result<(), RuntimeError> {
        self.call(move |e| e.set_static_rf_callback(callback)).await
    }
}
