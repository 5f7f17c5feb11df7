//! ENC28J60 register addresses and receive status vector bits.
//!
//! Based on the ENC28J60 data sheet (DS39662), sections 3 and 7.2.

#![allow(dead_code)]

/// Special function register addresses used by the receive path.
///
/// The upper bits select the bank; the bus layer performs bank switching.
pub mod sfr {
    /// Bank 0: buffer read pointer, low byte (ERDPTH follows)
    pub const ERDPTL: u8 = 0x00;
    /// Bank 0: RX read pointer, low byte (ERXRDPTH follows)
    pub const ERXRDPTL: u8 = 0x0C;
    /// Bank 1: Ethernet packet count
    pub const EPKTCNT: u8 = 0x20 | 0x19;
    /// Common: ECON2 control register
    pub const ECON2: u8 = 0x1E;
}

/// ECON2 bits
pub mod econ2 {
    /// Packet decrement: writing 1 decrements EPKTCNT
    pub const PKTDEC: u8 = 1 << 6;
}

/// Receive status vector status word (RSV bits 16..31, stored as a `u16`)
pub mod rsv {
    /// Long event or drop event
    pub const LONG_DROP_EVENT: u16 = 1 << 0;
    /// Carrier event previously seen
    pub const CARRIER_EVENT: u16 = 1 << 2;
    /// CRC error
    pub const CRC_ERROR: u16 = 1 << 4;
    /// Length check error
    pub const LENGTH_CHECK_ERROR: u16 = 1 << 5;
    /// Type/length field out of range
    pub const LENGTH_OUT_OF_RANGE: u16 = 1 << 6;
    /// Received OK
    pub const RX_OK: u16 = 1 << 7;
    /// Destination is a multicast address
    pub const MULTICAST: u16 = 1 << 8;
    /// Destination is the broadcast address
    pub const BROADCAST: u16 = 1 << 9;
    /// Dribble nibble
    pub const DRIBBLE_NIBBLE: u16 = 1 << 10;
    /// Control frame
    pub const CONTROL_FRAME: u16 = 1 << 11;
    /// Pause control frame
    pub const PAUSE_FRAME: u16 = 1 << 12;
    /// Unknown control opcode
    pub const UNKNOWN_OPCODE: u16 = 1 << 13;
    /// VLAN tagged frame
    pub const VLAN_TYPE: u16 = 1 << 14;
    /// Always zero on a valid vector
    pub const ZERO: u16 = 1 << 15;
}
