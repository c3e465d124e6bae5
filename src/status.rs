//! NCI and host-stack status codes.
//!
//! Values below `0xE0` come from the controller; the upper range is reserved
//! for conditions the host stack reports itself (timeouts, flow-control
//! continuation, busy windows and so on).

/// Status code carried by responses, notifications and upstream events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Status(u8);

impl Status {
    pub const OK: Self = Self(0x00);
    pub const REJECTED: Self = Self(0x01);
    pub const MSG_CORRUPTED: Self = Self(0x02);
    pub const BUFFER_FULL: Self = Self(0xE0);
    pub const FAILED: Self = Self(0x03);
    pub const NOT_INITIALIZED: Self = Self(0x04);
    pub const SYNTAX_ERROR: Self = Self(0x05);
    pub const SEMANTIC_ERROR: Self = Self(0x06);
    pub const UNKNOWN_GID: Self = Self(0x07);
    pub const UNKNOWN_OID: Self = Self(0x08);
    pub const INVALID_PARAM: Self = Self(0x09);
    pub const MSG_SIZE_TOO_BIG: Self = Self(0x0A);
    pub const ALREADY_STARTED: Self = Self(0xA0);
    pub const ACTIVATION_FAILED: Self = Self(0xA1);
    pub const TEAR_DOWN: Self = Self(0xA2);
    pub const RF_TRANSMISSION_ERR: Self = Self(0xB0);
    pub const RF_PROTOCOL_ERR: Self = Self(0xB1);
    pub const TIMEOUT: Self = Self(0xB2);
    pub const EE_INTF_ACTIVE_FAIL: Self = Self(0xC0);
    pub const EE_TRANSMISSION_ERR: Self = Self(0xC1);
    pub const EE_PROTOCOL_ERR: Self = Self(0xC2);
    pub const EE_TIMEOUT: Self = Self(0xC3);
    pub const CMD_STARTED: Self = Self(0xE3);
    pub const HW_TIMEOUT: Self = Self(0xE4);
    pub const CONTINUE: Self = Self(0xE5);
    pub const REFUSED: Self = Self(0xE6);
    pub const BAD_RESP: Self = Self(0xE7);
    pub const CMD_NOT_CMPLTD: Self = Self(0xE8);
    pub const NO_BUFFERS: Self = Self(0xE9);
    pub const WRONG_PROTOCOL: Self = Self(0xEA);
    pub const BUSY: Self = Self(0xEB);
    pub const LINK_LOSS: Self = Self(0xFC);
    pub const BAD_LENGTH: Self = Self(0xFD);
    pub const BAD_HANDLE: Self = Self(0xFE);
    pub const CONGESTED: Self = Self(0xFF);

    /// Wrap a raw status byte.
    #[must_use]
    pub const fn new(value: u8) -> Self { Self(value) }

    /// Raw status byte.
    #[must_use]
    pub const fn get(self) -> u8 { self.0 }

    /// Whether this is [`Status::OK`].
    #[must_use]
    pub const fn is_ok(self) -> bool { self.0 == Self::OK.0 }

    /// Canonical uppercase name, or `UNKNOWN`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OK => "OK",
            Self::REJECTED => "REJECTED",
            Self::MSG_CORRUPTED => "MSG_CORRUPTED",
            Self::BUFFER_FULL => "BUFFER_FULL",
            Self::FAILED => "FAILED",
            Self::NOT_INITIALIZED => "NOT_INITIALIZED",
            Self::SYNTAX_ERROR => "SYNTAX_ERROR",
            Self::SEMANTIC_ERROR => "SEMANTIC_ERROR",
            Self::UNKNOWN_GID => "UNKNOWN_GID",
            Self::UNKNOWN_OID => "UNKNOWN_OID",
            Self::INVALID_PARAM => "INVALID_PARAM",
            Self::MSG_SIZE_TOO_BIG => "MSG_SIZE_TOO_BIG",
            Self::ALREADY_STARTED => "ALREADY_STARTED",
            Self::ACTIVATION_FAILED => "ACTIVATION_FAILED",
            Self::TEAR_DOWN => "TEAR_DOWN",
            Self::RF_TRANSMISSION_ERR => "RF_TRANSMISSION_ERR",
            Self::RF_PROTOCOL_ERR => "RF_PROTOCOL_ERR",
            Self::TIMEOUT => "TIMEOUT",
            Self::EE_INTF_ACTIVE_FAIL => "EE_INTF_ACTIVE_FAIL",
            Self::EE_TRANSMISSION_ERR => "EE_TRANSMISSION_ERR",
            Self::EE_PROTOCOL_ERR => "EE_PROTOCOL_ERR",
            Self::EE_TIMEOUT => "EE_TIMEOUT",
            Self::CMD_STARTED => "CMD_STARTED",
            Self::HW_TIMEOUT => "HW_TIMEOUT",
            Self::CONTINUE => "CONTINUE",
            Self::REFUSED => "REFUSED",
            Self::BAD_RESP => "BAD_RESP",
            Self::CMD_NOT_CMPLTD => "CMD_NOT_CMPLTD",
            Self::NO_BUFFERS => "NO_BUFFERS",
            Self::WRONG_PROTOCOL => "WRONG_PROTOCOL",
            Self::BUSY => "BUSY",
            Self::LINK_LOSS => "LINK_LOSS",
            Self::BAD_LENGTH => "BAD_LENGTH",
            Self::BAD_HANDLE => "BAD_HANDLE",
            Self::CONGESTED => "CONGESTED",
            _ => "UNKNOWN",
        }
    }
}

impl From<u8> for Status {
    fn from(value: u8) -> Self { Self(value) }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:#04x})", self.name(), self.0)
    }
}
