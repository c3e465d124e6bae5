//! Upstream management requests.
//!
//! Every request validates its arguments and the protocol state, then queues
//! the encoded command. `Ok(())` means the command was accepted; the outcome
//! arrives later through the hooks.

use std::time::Duration;

use bytes::Bytes;
use log::warn;

use super::Engine;
use crate::{
    codec::{
        self,
        Gid,
        Writer,
        opcode::{core, ee, rf},
    },
    command::{PendingVendor, VendorCallback},
    config::TraceLevel,
    conn::{ConnCallback, ConnHandle, ConnId, ConnKind},
    error::{NciError, Result},
    event::DeactivateType,
    hooks::VendorListener,
    params::{self, DiscoverMap, DiscoverParam, destination, nfcee_discover, protocol},
    state::NfcState,
    timer::TimerKind,
    transport::Transport,
};

/// TLV tags of CORE_CONN_CREATE destination parameters.
const TLV_RF_DISCOVERY_ID: u8 = 0x00;
const TLV_NFCEE_VALUE: u8 = 0x01;

impl<T: Transport> Engine<T> {
    /// Write configuration parameters.
    ///
    /// `tlvs` is a sequence of `{id, len, value}` entries.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] before enabling completes, or a
    /// frame error if `tlvs` is malformed or too long.
    pub fn set_config(&mut self, tlvs: &[u8]) -> Result<()> {
        self.api_trace("set_config");
        self.require_enabled()?;
        let count = params::count_tlvs(tlvs)?;
        let mut payload = Writer::new();
        payload.count(count)?.slice(tlvs)?;
        self.send_command(Gid::CORE, core::SET_CONFIG, payload.finish())
    }

    /// Read configuration parameters by id.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] before enabling completes, or a
    /// frame error if too many ids are given.
    pub fn get_config(&mut self, ids: &[u8]) -> Result<()> {
        self.api_trace("get_config");
        self.require_enabled()?;
        let mut payload = Writer::new();
        payload.count(ids.len())?.slice(ids)?;
        self.send_command(Gid::CORE, core::GET_CONFIG, payload.finish())
    }

    /// Whether the controller reported `interface` in CORE_INIT.
    #[must_use]
    pub fn supports_interface(&self, interface: u8) -> bool {
        self.capabilities
            .as_ref()
            .is_some_and(|caps| caps.interfaces.contains(&interface))
    }

    /// Configure which interface the controller activates per protocol.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::InvalidParam`] if an entry names an interface the
    /// controller did not report, or [`NciError::NotInitialized`] before
    /// enabling completes.
    pub fn discover_map(&mut self, maps: &[DiscoverMap]) -> Result<()> {
        self.api_trace("discover_map");
        self.require_enabled()?;
        if let Some(map) = maps.iter().find(|map| !self.supports_interface(map.interface)) {
            warn!("interface {:#04x} is not supported by the controller", map.interface);
            return Err(NciError::InvalidParam("interface not supported"));
        }
        self.send_discover_map(maps)
    }

    pub(crate) fn send_discover_map(&mut self, maps: &[DiscoverMap]) -> Result<()> {
        let mut payload = Writer::new();
        payload.count(maps.len())?;
        for map in maps {
            payload.u8(map.protocol)?.u8(map.mode)?.u8(map.interface)?;
        }
        self.send_command(Gid::RF_MANAGE, rf::DISCOVER_MAP, payload.finish())
    }

    /// Start RF discovery.
    ///
    /// The command is parked until the channel is free. If the transport
    /// wants a pre-discovery sequence it runs first, and the discover command
    /// follows [`HalEvent::PreDiscoverComplete`](crate::transport::HalEvent).
    ///
    /// # Errors
    ///
    /// Returns [`NciError::Busy`] if a start is already pending, or
    /// [`NciError::NotInitialized`] unless the engine is idle.
    pub fn start_discovery(&mut self, params: &[DiscoverParam]) -> Result<()> {
        self.api_trace("start_discovery");
        if self.state != NfcState::Idle {
            return Err(NciError::NotInitialized(self.state));
        }
        if self.flags.discover_pending {
            return Err(NciError::Busy);
        }
        let mut payload = Writer::new();
        payload.count(params.len())?;
        for param in params {
            payload.u8(param.mode)?.u8(param.frequency)?;
        }
        let packet = codec::command(Gid::RF_MANAGE, rf::DISCOVER, payload.finish())?;
        self.channel.set_pending_discovery(packet);
        self.flags.discover_pending = true;
        self.flags.control_requested = true;
        self.check_cmd_queue();
        Ok(())
    }

    /// Select one of several discovered endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] before enabling completes.
    pub fn select(&mut self, rf_disc_id: u8, protocol: u8, interface: u8) -> Result<()> {
        self.api_trace("select");
        self.require_enabled()?;
        self.send_command(
            Gid::RF_MANAGE,
            rf::DISCOVER_SELECT,
            vec![rf_disc_id, protocol, interface],
        )
    }

    /// Deactivate the RF link or stop discovery.
    ///
    /// A discovery start still waiting for the channel is simply withdrawn.
    /// While NFC-DEP credits are outstanding the deactivate waits for them
    /// (or for `deactivate_wait`) before the command goes out.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] before enabling completes.
    pub fn deactivate(&mut self, kind: DeactivateType) -> Result<()> {
        self.api_trace("deactivate");
        if self.flags.discover_pending {
            self.flags.discover_pending = false;
            if !self.flags.hal_requested {
                self.flags.control_requested = false;
            }
            self.channel.take_pending_discovery();
            return Ok(());
        }
        self.require_enabled()?;
        if self.state == NfcState::Open {
            self.set_state(NfcState::Closing);
            let outstanding = self.connection(ConnId::RF).is_some_and(|rf| {
                rf.protocol() == protocol::NFC_DEP && rf.initial_credits() != rf.credits()
            });
            if outstanding {
                self.flags.deactivating = true;
                self.deferred_deactivate = Some(kind);
                self.start_timer(TimerKind::DeactivateWait, self.config.deactivate_wait);
                return Ok(());
            }
        }
        self.send_deactivate(kind)
    }

    pub(crate) fn send_deactivate(&mut self, kind: DeactivateType) -> Result<()> {
        self.send_command(Gid::RF_MANAGE, rf::DEACTIVATE, vec![kind.to_u8()])
    }

    /// Create a logical connection to a remote endpoint, an NFCEE or the
    /// controller's loopback.
    ///
    /// The returned handle names the block until the controller assigns an
    /// id; `callback` then receives [`ConnEvent::Created`](crate::event::ConnEvent)
    /// and every later event.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::InvalidParam`] for [`ConnKind::Rf`],
    /// [`NciError::Busy`] if another create is outstanding,
    /// [`NciError::NoBuffers`] if the table is full, or
    /// [`NciError::NotInitialized`] before enabling completes.
    pub fn conn_create(&mut self, kind: ConnKind, callback: ConnCallback) -> Result<ConnHandle> {
        self.api_trace("conn_create");
        self.require_enabled()?;
        let mut payload = Writer::new();
        match kind {
            ConnKind::Rf => return Err(NciError::InvalidParam("the RF connection is static")),
            ConnKind::Loopback => {
                payload.u8(destination::LOOPBACK)?.u8(0)?;
            }
            ConnKind::Remote { rf_disc_id } => {
                payload
                    .u8(destination::REMOTE)?
                    .u8(1)?
                    .u8(TLV_RF_DISCOVERY_ID)?
                    .u8(1)?
                    .u8(rf_disc_id)?;
            }
            ConnKind::Nfcee { nfcee_id, protocol } => {
                payload
                    .u8(destination::NFCEE)?
                    .u8(1)?
                    .u8(TLV_NFCEE_VALUE)?
                    .u8(2)?
                    .u8(nfcee_id)?
                    .u8(protocol)?;
            }
        }
        let handle = self.conns.allocate(kind, Some(callback))?;
        if let Err(err) = self.send_command(Gid::CORE, core::CONN_CREATE, payload.finish()) {
            self.conns.free(handle);
            return Err(err);
        }
        if let (Some(block), ConnKind::Nfcee { protocol, .. }) = (self.conns.get_mut(handle), kind) {
            block.protocol = protocol;
        }
        Ok(handle)
    }

    /// Close a logical connection created by [`Engine::conn_create`].
    ///
    /// # Errors
    ///
    /// Returns [`NciError::InvalidParam`] for the RF connection,
    /// [`NciError::BadHandle`] if `id` is not bound, or
    /// [`NciError::NotInitialized`] before enabling completes.
    pub fn conn_close(&mut self, id: ConnId) -> Result<()> {
        self.api_trace("conn_close");
        self.require_enabled()?;
        if id == ConnId::RF {
            return Err(NciError::InvalidParam("the RF connection is static"));
        }
        self.conns.find_by_id(id).ok_or(NciError::BadHandle)?;
        self.send_command(Gid::CORE, core::CONN_CLOSE, vec![id.get()])
    }

    /// Send a proprietary command; `callback` receives its response.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] before enabling completes, or a
    /// frame error if `payload` does not fit one packet.
    pub fn send_vendor_command(
        &mut self,
        oid: u8,
        payload: impl Into<Bytes>,
        callback: VendorCallback,
    ) -> Result<()> {
        self.api_trace("send_vendor_command");
        self.require_enabled()?;
        let packet = codec::command(Gid::PROPRIETARY, oid, payload)?;
        self.channel
            .enqueue(packet, Some(PendingVendor::new(oid, callback)));
        self.check_cmd_queue();
        Ok(())
    }

    /// Register a listener for proprietary notifications.
    ///
    /// Returns the slot index to pass to
    /// [`Engine::deregister_vendor_callback`].
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NoBuffers`] when every slot is taken.
    pub fn register_vendor_callback(&mut self, listener: VendorListener) -> Result<usize> {
        let slot = self
            .vendor_listeners
            .iter()
            .position(Option::is_none)
            .ok_or(NciError::NoBuffers("vendor callback slot"))?;
        self.vendor_listeners[slot] = Some(listener);
        Ok(slot)
    }

    /// Remove the listener in `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::InvalidParam`] if the slot is out of range or
    /// empty.
    pub fn deregister_vendor_callback(&mut self, slot: usize) -> Result<()> {
        self.vendor_listeners
            .get_mut(slot)
            .and_then(Option::take)
            .map(|_| ())
            .ok_or(NciError::InvalidParam("vendor callback slot"))
    }

    /// Poll for FeliCa cards answering `system_code`.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] before enabling completes.
    pub fn t3t_polling(&mut self, system_code: u16, request_code: u8, time_slot: u8) -> Result<()> {
        self.api_trace("t3t_polling");
        self.require_enabled()?;
        let mut payload = Writer::new();
        payload.u16_be(system_code)?.u8(request_code)?.u8(time_slot)?;
        self.send_command(Gid::RF_MANAGE, rf::T3T_POLLING, payload.finish())
    }

    /// Write a chunk of the listen-mode routing table.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] before enabling completes, or a
    /// frame error if `tlvs` is malformed or too long.
    pub fn set_routing(&mut self, more: bool, tlvs: &[u8]) -> Result<()> {
        self.api_trace("set_routing");
        self.require_enabled()?;
        let count = params::count_tlvs(tlvs)?;
        let mut payload = Writer::new();
        payload.u8(u8::from(more))?.count(count)?.slice(tlvs)?;
        self.send_command(Gid::RF_MANAGE, rf::SET_ROUTING, payload.finish())
    }

    /// Read the listen-mode routing table.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] before enabling completes.
    pub fn get_routing(&mut self) -> Result<()> {
        self.api_trace("get_routing");
        self.require_enabled()?;
        self.send_command(Gid::RF_MANAGE, rf::GET_ROUTING, Bytes::new())
    }

    /// Update RF communication parameters.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] before enabling completes, or a
    /// frame error if `tlvs` is malformed or too long.
    pub fn rf_parameter_update(&mut self, tlvs: &[u8]) -> Result<()> {
        self.api_trace("rf_parameter_update");
        self.require_enabled()?;
        let count = params::count_tlvs(tlvs)?;
        let mut payload = Writer::new();
        payload.count(count)?.slice(tlvs)?;
        self.send_command(Gid::RF_MANAGE, rf::PARAMETER_UPDATE, payload.finish())
    }

    /// Enable or disable NFCEE discovery.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] before enabling completes.
    pub fn nfcee_discover(&mut self, enable: bool) -> Result<()> {
        self.api_trace("nfcee_discover");
        self.require_enabled()?;
        let action = if enable {
            nfcee_discover::ENABLE
        } else {
            nfcee_discover::DISABLE
        };
        self.send_command(Gid::EE_MANAGE, ee::DISCOVER, vec![action])
    }

    /// Switch an NFCEE on or off.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::NotInitialized`] before enabling completes.
    pub fn nfcee_mode_set(&mut self, nfcee_id: u8, mode: u8) -> Result<()> {
        self.api_trace("nfcee_mode_set");
        self.require_enabled()?;
        self.send_command(Gid::EE_MANAGE, ee::MODE_SET, vec![nfcee_id, mode])
    }

    /// Start an owner-defined timer reported as
    /// [`ResponseEvent::QuickTimer`](crate::event::ResponseEvent).
    pub fn start_quick_timer(&mut self, id: u16, after: Duration) {
        self.start_timer(TimerKind::Quick(id), after);
    }

    /// Stop a quick timer. Returns whether it was running.
    pub fn stop_quick_timer(&mut self, id: u16) -> bool { self.quick_timers.stop(TimerKind::Quick(id)) }

    /// Choose whether RF-connection data is delivered only once all segments
    /// have arrived.
    pub fn set_reassembly(&mut self, enabled: bool) { self.reassembly = enabled; }

    /// Change the protocol trace level, returning the previous one.
    pub fn set_trace_level(&mut self, level: TraceLevel) -> TraceLevel {
        std::mem::replace(&mut self.trace_level, level)
    }

    /// Install the owner of the static RF connection.
    pub fn set_static_rf_callback(&mut self, callback: Option<ConnCallback>) {
        if let Some(block) = self.conns.by_id_mut(ConnId::RF) {
            block.callback.clone_from(&callback);
        }
        self.rf_callback = callback;
    }
}
