//! Opcode identifiers per NCI group.

use super::Gid;

/// Core group opcodes.
pub mod core {
    pub const RESET: u8 = 0x00;
    pub const INIT: u8 = 0x01;
    pub const SET_CONFIG: u8 = 0x02;
    pub const GET_CONFIG: u8 = 0x03;
    pub const CONN_CREATE: u8 = 0x04;
    pub const CONN_CLOSE: u8 = 0x05;
    pub const CONN_CREDITS: u8 = 0x06;
    pub const GENERIC_ERROR: u8 = 0x07;
    pub const INTERFACE_ERROR: u8 = 0x08;
}

/// RF management group opcodes.
pub mod rf {
    pub const DISCOVER_MAP: u8 = 0x00;
    pub const SET_ROUTING: u8 = 0x01;
    pub const GET_ROUTING: u8 = 0x02;
    pub const DISCOVER: u8 = 0x03;
    pub const DISCOVER_SELECT: u8 = 0x04;
    pub const INTF_ACTIVATED: u8 = 0x05;
    pub const DEACTIVATE: u8 = 0x06;
    pub const FIELD: u8 = 0x07;
    pub const T3T_POLLING: u8 = 0x08;
    pub const EE_ACTION: u8 = 0x09;
    pub const EE_DISCOVERY_REQ: u8 = 0x0A;
    pub const PARAMETER_UPDATE: u8 = 0x0B;
}

/// NFCEE management group opcodes.
pub mod ee {
    pub const DISCOVER: u8 = 0x00;
    pub const MODE_SET: u8 = 0x01;
}

/// Canonical `GROUP_OPCODE` name for a control packet, used in traces.
#[must_use]
pub fn name(gid: Gid, oid: u8) -> &'static str {
    match (gid, oid) {
        (Gid::CORE, core::RESET) => "CORE_RESET",
        (Gid::CORE, core::INIT) => "CORE_INIT",
        (Gid::CORE, core::SET_CONFIG) => "CORE_SET_CONFIG",
        (Gid::CORE, core::GET_CONFIG) => "CORE_GET_CONFIG",
        (Gid::CORE, core::CONN_CREATE) => "CORE_CONN_CREATE",
        (Gid::CORE, core::CONN_CLOSE) => "CORE_CONN_CLOSE",
        (Gid::CORE, core::CONN_CREDITS) => "CORE_CONN_CREDITS",
        (Gid::CORE, core::GENERIC_ERROR) => "CORE_GENERIC_ERROR",
        (Gid::CORE, core::INTERFACE_ERROR) => "CORE_INTERFACE_ERROR",
        (Gid::RF_MANAGE, rf::DISCOVER_MAP) => "RF_DISCOVER_MAP",
        (Gid::RF_MANAGE, rf::SET_ROUTING) => "RF_SET_ROUTING",
        (Gid::RF_MANAGE, rf::GET_ROUTING) => "RF_GET_ROUTING",
        (Gid::RF_MANAGE, rf::DISCOVER) => "RF_DISCOVER",
        (Gid::RF_MANAGE, rf::DISCOVER_SELECT) => "RF_DISCOVER_SELECT",
        (Gid::RF_MANAGE, rf::INTF_ACTIVATED) => "RF_INTF_ACTIVATED",
        (Gid::RF_MANAGE, rf::DEACTIVATE) => "RF_DEACTIVATE",
        (Gid::RF_MANAGE, rf::FIELD) => "RF_FIELD_INFO",
        (Gid::RF_MANAGE, rf::T3T_POLLING) => "RF_T3T_POLLING",
        (Gid::RF_MANAGE, rf::EE_ACTION) => "RF_NFCEE_ACTION",
        (Gid::RF_MANAGE, rf::EE_DISCOVERY_REQ) => "RF_NFCEE_DISCOVERY_REQ",
        (Gid::RF_MANAGE, rf::PARAMETER_UPDATE) => "RF_PARAMETER_UPDATE",
        (Gid::EE_MANAGE, ee::DISCOVER) => "NFCEE_DISCOVER",
        (Gid::EE_MANAGE, ee::MODE_SET) => "NFCEE_MODE_SET",
        (Gid::PROPRIETARY, _) => "PROPRIETARY",
        _ => "UNKNOWN",
    }
}
