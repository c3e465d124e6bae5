//! Events reported to the layers above the engine.
//!
//! Synchronous calls return a status straight away; everything that completes
//! later arrives as one of these values through [`Hooks`](crate::hooks::Hooks)
//! or a connection's owner callback.

use bytes::Bytes;

use crate::status::Status;

/// Controller properties reported by CORE_INIT.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NfccCapabilities {
    /// NCI version from the preceding CORE_RESET response.
    pub nci_version: u8,
    /// Supported feature bitmap.
    pub features: u32,
    /// RF interfaces the controller implements.
    pub interfaces: Vec<u8>,
    /// Logical connections beyond the static RF connection.
    pub max_connections: u8,
    /// Routing table capacity in bytes.
    pub max_routing_table_size: u16,
    /// Largest control packet payload.
    pub max_control_payload: u8,
    /// Largest configuration parameter.
    pub max_parameter_size: u16,
    /// Manufacturer id.
    pub manufacturer_id: u8,
    /// Manufacturer-specific information.
    pub manufacturer_info: [u8; 4],
}

/// Technology-specific parameters of a discovered or activated endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RfTechParams {
    /// RF technology and mode.
    pub mode: u8,
    /// Raw parameter bytes.
    pub params: Bytes,
}

/// Kind of RF deactivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeactivateType {
    /// Back to RF idle.
    Idle,
    /// Put the remote endpoint to sleep.
    Sleep,
    /// Put the remote endpoint to sleep with ATTRIB/AF semantics.
    SleepAf,
    /// Restart discovery.
    Discovery,
}

impl DeactivateType {
    /// Wire value.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Sleep => 1,
            Self::SleepAf => 2,
            Self::Discovery => 3,
        }
    }

    /// Decode a wire value; unknown values fall back to [`DeactivateType::Idle`].
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Sleep,
            2 => Self::SleepAf,
            3 => Self::Discovery,
            _ => Self::Idle,
        }
    }
}

/// Outcome of an RF deactivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deactivation {
    /// Status of the response, or [`Status::OK`] for a notification.
    pub status: Status,
    /// Requested or reported deactivation type.
    pub kind: DeactivateType,
    /// Whether the controller reported the deactivation unsolicited.
    pub is_ntf: bool,
}

/// Details of an activated RF interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activation {
    /// RF discovery id of the endpoint.
    pub rf_disc_id: u8,
    /// Activated RF interface.
    pub interface: u8,
    /// RF protocol.
    pub protocol: u8,
    /// Activation RF technology and mode.
    pub mode: u8,
    /// Largest data payload per packet on the RF connection.
    pub max_payload: u8,
    /// Initial credits on the RF connection.
    pub credits: u8,
    /// Technology parameters.
    pub tech: RfTechParams,
    /// Data exchange technology and mode.
    pub data_mode: u8,
    /// Transmit bit rate.
    pub tx_bitrate: u8,
    /// Receive bit rate.
    pub rx_bitrate: u8,
    /// Interface activation parameters, uninterpreted.
    pub activation_params: Bytes,
}

/// Events delivered to a connection's owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnEvent {
    /// CORE_CONN_CREATE completed.
    Created {
        /// Response status; the connection is already gone when not OK.
        status: Status,
        /// Negotiated payload size.
        max_payload: u8,
        /// Initial credits.
        credits: u8,
    },
    /// The connection was closed and its control block released.
    Closed {
        /// Close status.
        status: Status,
    },
    /// Inbound data.
    Data {
        /// [`Status::OK`] for a complete buffer, [`Status::CONTINUE`] when
        /// more of the same unit follows, or an RF status stripped from the
        /// buffer.
        status: Status,
        /// Payload bytes.
        data: Bytes,
    },
    /// The first segment of a multi-segment inbound transfer arrived.
    DataStart,
    /// The RF link went down.
    Deactivated(Deactivation),
    /// The controller reported an interface error on this connection.
    Error(Status),
}

/// Results of discovery-related commands and notifications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiscoverEvent {
    /// RF_DISCOVER response.
    Started(Status),
    /// RF_DISCOVER_MAP response.
    Map(Status),
    /// An endpoint was discovered.
    Result {
        /// RF discovery id.
        rf_disc_id: u8,
        /// RF protocol.
        protocol: u8,
        /// Technology parameters.
        tech: RfTechParams,
        /// More results follow.
        more: bool,
    },
    /// RF_DISCOVER_SELECT response.
    Select(Status),
    /// An RF interface was activated.
    Activated(Activation),
    /// RF deactivation completed.
    Deactivated(Deactivation),
    /// RF_T3T_POLLING outcome.
    T3tPolling {
        /// Response or notification status.
        status: Status,
        /// Number of responses.
        count: u8,
        /// Raw response bytes.
        responses: Bytes,
    },
    /// The controller reported a discovery error.
    Error(Status),
}

/// Results of management commands and unsolicited controller reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseEvent {
    /// Enabling finished; any status other than OK is a terminal failure.
    Enabled {
        /// Outcome.
        status: Status,
        /// Controller capabilities when enabling succeeded.
        capabilities: Option<NfccCapabilities>,
    },
    /// The transport was closed and the engine is uninitialised.
    Disabled,
    /// CORE_RESET response received outside enabling.
    Reset {
        /// Response status.
        status: Status,
        /// Reported NCI version.
        nci_version: u8,
        /// Whether configuration was kept.
        config_status: u8,
    },
    /// CORE_SET_CONFIG response.
    SetConfig {
        /// Response status.
        status: Status,
        /// Ids of parameters the controller rejected.
        failed_ids: Bytes,
    },
    /// CORE_GET_CONFIG response.
    GetConfig {
        /// Response status.
        status: Status,
        /// Returned TLVs.
        tlvs: Bytes,
    },
    /// RF field presence changed.
    RfField {
        /// An external field is present.
        on: bool,
    },
    /// RF_SET_LISTEN_MODE_ROUTING response.
    SetRouting(Status),
    /// Chunk of the routing table.
    GetRouting {
        /// [`Status::CONTINUE`] until the last chunk.
        status: Status,
        /// Routing TLVs.
        tlvs: Bytes,
    },
    /// RF_PARAMETER_UPDATE response.
    RfParamUpdate {
        /// Response status.
        status: Status,
        /// Ids of parameters the controller rejected.
        failed_ids: Bytes,
    },
    /// NFCEE_DISCOVER response.
    NfceeDiscover {
        /// Response status.
        status: Status,
        /// Number of NFCEEs.
        num_nfcee: u8,
    },
    /// NFCEE_DISCOVER notification, uninterpreted.
    NfceeInfo(Bytes),
    /// NFCEE_MODE_SET response.
    NfceeModeSet {
        /// Response status.
        status: Status,
        /// NFCEE the command addressed.
        nfcee_id: u8,
        /// Requested mode.
        mode: u8,
    },
    /// RF_NFCEE_ACTION notification, uninterpreted.
    EeAction(Bytes),
    /// RF_NFCEE_DISCOVERY_REQ notification, uninterpreted.
    EeDiscoveryRequest(Bytes),
    /// Power-off sleep entered.
    PowerOffSleep {
        /// Close status.
        status: Status,
    },
    /// Power cycle or sleep exit finished.
    NfccRestart {
        /// Outcome.
        status: Status,
    },
    /// CORE_GENERIC_ERROR notification.
    GenericError(Status),
    /// The controller stopped answering.
    NfccTimeout(Status),
    /// A command timeout was recovered from; the channel is idle again.
    Recovered,
    /// The transport failed after enabling.
    LinkLoss,
    /// An owner-defined quick timer expired.
    QuickTimer(u16),
}

/// Proprietary response or notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VendorEvent {
    /// Message type bits of the packet.
    pub mt: u8,
    /// Proprietary opcode.
    pub oid: u8,
    /// Packet payload.
    pub payload: Bytes,
}
