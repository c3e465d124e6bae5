//! Public API for the `ncilink` library.
//!
//! `ncilink` is the command/response transport engine of an NFC Controller
//! Interface stack. It frames NCI packets, keeps one command in flight,
//! tracks logical connections and their credits, fragments and reassembles
//! data, and sequences the controller through reset, initialisation, power
//! modes and recovery.
//!
//! The [`Engine`] is a synchronous state machine driven through `&mut self`;
//! [`runtime`] wraps it in a Tokio actor with a cloneable [`NciHandle`].

pub mod byte_order;
pub mod codec;
pub mod command;
pub mod config;
pub mod conn;
pub mod data;
pub mod engine;
pub mod error;
pub mod event;
pub mod hooks;
pub mod metrics;
pub mod params;
mod router;
pub mod runtime;
pub mod state;
pub mod status;
pub mod timer;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use codec::{ControlFrame, DataFrame, Frame, FrameError, Gid, MessageType, PacketHeader};
pub use config::{NciConfig, TraceLevel};
pub use conn::{ConnCallback, ConnHandle, ConnId, ConnKind};
pub use engine::Engine;
pub use error::{NciError, Result};
pub use event::{
    Activation,
    ConnEvent,
    DeactivateType,
    Deactivation,
    DiscoverEvent,
    NfccCapabilities,
    ResponseEvent,
    VendorEvent,
};
pub use hooks::{Hooks, NciCallbacks};
pub use params::{DiscoverMap, DiscoverParam};
pub use runtime::{EngineActor, NciHandle, RuntimeError, TransportSink};
pub use state::NfcState;
pub use status::Status;
pub use transport::{HalError, HalEvent, Transport};
