//! Helpers for explicit wire byte-order conversions.
//!
//! NCI carries multi-byte integers least-significant byte first, with the
//! exception of a handful of RF parameters (the T3T system code) that travel in
//! network order. These helpers keep Clippy expectations scoped to the
//! conversion points so protocol code stays explicit about endianness.

/// Serialise a `u16` in NCI byte order (little-endian).
///
/// # Examples
///
/// ```
/// use ncilink::byte_order::write_nci_u16;
///
/// assert_eq!(write_nci_u16(0x1234), [0x34, 0x12]);
/// ```
#[must_use]
pub fn write_nci_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "NCI integers are little-endian on the wire."
    )]
    value.to_le_bytes()
}

/// Parse an NCI-order `u16` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use ncilink::byte_order::read_nci_u16;
///
/// assert_eq!(read_nci_u16([0x34, 0x12]), 0x1234);
/// ```
#[must_use]
pub fn read_nci_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "NCI integers are little-endian on the wire."
    )]
    u16::from_le_bytes(bytes)
}

/// Parse an NCI-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use ncilink::byte_order::read_nci_u32;
///
/// assert_eq!(read_nci_u32([0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_nci_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "NCI integers are little-endian on the wire."
    )]
    u32::from_le_bytes(bytes)
}

/// Serialise a `u16` in network byte order (big-endian).
///
/// Used for the FeliCa system code carried by `RF_T3T_POLLING_CMD`.
///
/// # Examples
///
/// ```
/// use ncilink::byte_order::write_network_u16;
///
/// assert_eq!(write_network_u16(0x12FC), [0x12, 0xFC]);
/// ```
#[must_use]
pub fn write_network_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u16` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use ncilink::byte_order::read_network_u16;
///
/// assert_eq!(read_network_u16([0x12, 0xFC]), 0x12FC);
/// ```
#[must_use]
pub fn read_network_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u16::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0x0000)]
    #[case(0x00FF)]
    #[case(0xFE01)]
    #[case(u16::MAX)]
    fn nci_u16_roundtrip(#[case] value: u16) {
        assert_eq!(read_nci_u16(write_nci_u16(value)), value);
    }

    #[test]
    fn nci_and_network_orders_differ() {
        assert_eq!(write_nci_u16(0x0102), [0x02, 0x01]);
        assert_eq!(write_network_u16(0x0102), [0x01, 0x02]);
    }
}
