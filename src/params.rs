//! Parameters of upstream requests and the NCI constants they use.

use crate::codec::{FrameError, Reader};

/// RF protocols.
pub mod protocol {
    pub const T1T: u8 = 0x01;
    pub const T2T: u8 = 0x02;
    pub const T3T: u8 = 0x03;
    pub const ISO_DEP: u8 = 0x04;
    pub const NFC_DEP: u8 = 0x05;
}

/// RF interfaces.
pub mod interface {
    pub const EE_DIRECT: u8 = 0x00;
    pub const FRAME: u8 = 0x01;
    pub const ISO_DEP: u8 = 0x02;
    pub const NFC_DEP: u8 = 0x03;
    /// Values above this are proprietary.
    pub const MAX: u8 = 0x03;
}

/// Mode bits of a discovery map entry.
pub mod map_mode {
    pub const POLL: u8 = 0x01;
    pub const LISTEN: u8 = 0x02;
    pub const POLL_N_LISTEN: u8 = POLL | LISTEN;
}

/// One RF technology and mode to discover, with its polling frequency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscoverParam {
    /// RF technology and mode.
    pub mode: u8,
    /// Polling frequency; 1 means every period.
    pub frequency: u8,
}

/// Binding of an RF protocol to the interface the controller should
/// activate for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscoverMap {
    /// RF protocol.
    pub protocol: u8,
    /// Poll and/or listen, see [`map_mode`].
    pub mode: u8,
    /// RF interface.
    pub interface: u8,
}

/// Map issued once enabling completes.
pub const DEFAULT_DISCOVER_MAPS: [DiscoverMap; 2] = [
    DiscoverMap {
        protocol: protocol::ISO_DEP,
        mode: map_mode::POLL_N_LISTEN,
        interface: interface::ISO_DEP,
    },
    DiscoverMap {
        protocol: protocol::NFC_DEP,
        mode: map_mode::POLL_N_LISTEN,
        interface: interface::NFC_DEP,
    },
];

/// NFCEE_DISCOVER actions.
pub mod nfcee_discover {
    pub const DISABLE: u8 = 0x00;
    pub const ENABLE: u8 = 0x01;
}

/// CORE_CONN_CREATE destination types.
pub(crate) mod destination {
    pub const LOOPBACK: u8 = 0x01;
    pub const REMOTE: u8 = 0x02;
    pub const NFCEE: u8 = 0x03;
}

/// Count the type-length-value entries in `tlvs`.
///
/// # Errors
///
/// Returns [`FrameError::FieldOverrun`] if an entry's value runs past the end
/// of the buffer.
///
/// # Examples
///
/// ```
/// use ncilink::params::count_tlvs;
///
/// assert_eq!(count_tlvs(&[0x00, 0x01, 0x02, 0x10, 0x00]).expect("well formed"), 2);
/// assert!(count_tlvs(&[0x00, 0x04, 0x01]).is_err());
/// ```
pub fn count_tlvs(tlvs: &[u8]) -> Result<usize, FrameError> {
    let mut reader = Reader::new(tlvs);
    let mut count = 0;
    while !reader.is_empty() {
        reader.u8("tlv type")?;
        reader.length_prefixed("tlv value")?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_DISCOVER_MAPS, count_tlvs, interface};

    #[test]
    fn empty_buffer_holds_no_tlvs() {
        assert_eq!(count_tlvs(&[]).expect("empty"), 0);
    }

    #[test]
    fn dangling_type_byte_is_rejected() {
        assert!(count_tlvs(&[0x00, 0x00, 0x05]).is_err());
    }

    #[test]
    fn default_map_uses_standard_interfaces() {
        assert!(
            DEFAULT_DISCOVER_MAPS
                .iter()
                .all(|map| map.interface <= interface::MAX)
        );
    }
}
