//! Boundary to the hardware abstraction layer.
//!
//! The engine drives a [`Transport`] synchronously: every method is expected
//! to hand the work off and return quickly. Completions come back as
//! [`HalEvent`]s and inbound bytes, either through
//! [`Engine::on_hal_event`](crate::engine::Engine::on_hal_event) and
//! [`Engine::on_bytes`](crate::engine::Engine::on_bytes) directly or through a
//! [`TransportSink`](crate::runtime::TransportSink) when the engine runs
//! inside an [`EngineActor`](crate::runtime::EngineActor).

use std::io;

use bytes::Bytes;

use crate::status::Status;

/// Operations the engine needs from the physical transport.
pub trait Transport: Send + 'static {
    /// Begin opening the transport; completion is [`HalEvent::OpenComplete`].
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the request could not be issued.
    fn open(&mut self) -> io::Result<()>;

    /// Begin closing the transport; completion is [`HalEvent::CloseComplete`].
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the request could not be issued.
    fn close(&mut self) -> io::Result<()>;

    /// Write one complete NCI packet.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the packet could not be queued for sending.
    fn write(&mut self, packet: &[u8]) -> io::Result<()>;

    /// Hand the CORE_INIT response payload over for chip-specific
    /// post-initialisation; completion is [`HalEvent::PostInitComplete`].
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the request could not be issued.
    fn core_initialized(&mut self, init_rsp: &[u8]) -> io::Result<()>;

    /// Ask whether a pre-discovery sequence is needed.
    ///
    /// Returning `true` takes over the command channel until
    /// [`HalEvent::PreDiscoverComplete`] arrives.
    fn pre_discover(&mut self) -> bool { false }

    /// The channel has been handed over after a
    /// [`HalEvent::RequestControl`].
    fn control_granted(&mut self) {}

    /// Begin a controller power cycle; completion is
    /// [`HalEvent::OpenComplete`].
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the request could not be issued.
    fn power_cycle(&mut self) -> io::Result<()>;

    /// Write `packet` and wait for the controller's answer, bypassing the
    /// command window.
    ///
    /// Only used while recovering from a command timeout. One attempt, no
    /// retries.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the exchange failed.
    fn transceive(&mut self, packet: &[u8]) -> io::Result<Bytes>;
}

/// Failure category reported with [`HalEvent::Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HalError {
    /// The physical link failed.
    Transport,
    /// The transport's own command timed out.
    CommandTimeout,
}

/// Lifecycle notification from the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HalEvent {
    /// An open or power cycle finished.
    OpenComplete(Status),
    /// A close finished.
    CloseComplete(Status),
    /// Chip-specific post-initialisation finished.
    PostInitComplete(Status),
    /// The pre-discovery sequence finished; the channel is returned.
    PreDiscoverComplete(Status),
    /// The transport wants exclusive use of the channel.
    RequestControl,
    /// The transport hands the channel back.
    ReleaseControl(Status),
    /// The transport failed.
    Error(HalError),
}
