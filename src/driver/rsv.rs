//! Receive Status Vector
//!
//! The ENC28J60 prepends a 6-byte status vector to every frame in the RX ring:
//!
//! | Bytes | Field                              |
//! |-------|------------------------------------|
//! | 0..2  | Next packet pointer (LE)           |
//! | 2..4  | Received byte count incl. FCS (LE) |
//! | 4..6  | Status bits 16..31 (LE)            |

use crate::internal::constants::{MIN_RX_BYTE_COUNT, RSV_SIZE};
use crate::internal::enc28j60_regs::rsv;

/// Reason a status vector was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RsvFault {
    /// Next packet pointer is odd; the ring cursor is out of sync
    OddNextPacket,
    /// Frame failed the CRC check
    CrcError,
    /// The always-zero bit is set
    ZeroBitSet,
    /// Byte count above the configured maximum frame size
    Oversize,
    /// Byte count too small to hold a header and FCS
    Undersize,
    /// Received OK flag is clear
    NotOk,
}

/// Decoded receive status vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiveStatusVector {
    /// Ring address of the next frame's status vector
    pub next_packet: u16,
    /// Frame length including destination/source/type, payload and FCS
    pub rx_byte_count: u16,
    /// Long event or drop event
    pub long_drop_event: bool,
    /// Carrier event previously seen
    pub carrier_event: bool,
    /// CRC error
    pub crc_error: bool,
    /// Length check error
    pub length_check_error: bool,
    /// Type/length field out of range
    pub length_out_of_range: bool,
    /// Received OK
    pub rx_ok: bool,
    /// Multicast destination
    pub rx_multicast: bool,
    /// Broadcast destination
    pub rx_broadcast: bool,
    /// Dribble nibble
    pub dribble_nibble: bool,
    /// Control frame
    pub control_frame: bool,
    /// Pause control frame
    pub pause_frame: bool,
    /// Unknown control opcode
    pub unknown_opcode: bool,
    /// VLAN tagged frame
    pub vlan_type: bool,
    /// Reserved bit, zero on every valid vector
    pub zero: bool,
}

impl ReceiveStatusVector {
    /// All-zero vector
    pub const EMPTY: Self = Self {
        next_packet: 0,
        rx_byte_count: 0,
        long_drop_event: false,
        carrier_event: false,
        crc_error: false,
        length_check_error: false,
        length_out_of_range: false,
        rx_ok: false,
        rx_multicast: false,
        rx_broadcast: false,
        dribble_nibble: false,
        control_frame: false,
        pause_frame: false,
        unknown_opcode: false,
        vlan_type: false,
        zero: false,
    };

    /// Decode from the raw bytes read out of the ring
    pub fn from_bytes(raw: &[u8; RSV_SIZE]) -> Self {
        let status = u16::from_le_bytes([raw[4], raw[5]]);
        Self {
            next_packet: u16::from_le_bytes([raw[0], raw[1]]),
            rx_byte_count: u16::from_le_bytes([raw[2], raw[3]]),
            long_drop_event: (status & rsv::LONG_DROP_EVENT) != 0,
            carrier_event: (status & rsv::CARRIER_EVENT) != 0,
            crc_error: (status & rsv::CRC_ERROR) != 0,
            length_check_error: (status & rsv::LENGTH_CHECK_ERROR) != 0,
            length_out_of_range: (status & rsv::LENGTH_OUT_OF_RANGE) != 0,
            rx_ok: (status & rsv::RX_OK) != 0,
            rx_multicast: (status & rsv::MULTICAST) != 0,
            rx_broadcast: (status & rsv::BROADCAST) != 0,
            dribble_nibble: (status & rsv::DRIBBLE_NIBBLE) != 0,
            control_frame: (status & rsv::CONTROL_FRAME) != 0,
            pause_frame: (status & rsv::PAUSE_FRAME) != 0,
            unknown_opcode: (status & rsv::UNKNOWN_OPCODE) != 0,
            vlan_type: (status & rsv::VLAN_TYPE) != 0,
            zero: (status & rsv::ZERO) != 0,
        }
    }

    /// Check the vector before trusting its pointer and length.
    ///
    /// Any fault means the ring cursor can no longer be trusted and the frame
    /// must be dropped.
    pub fn check(&self, max_frame_size: u16) -> Result<(), RsvFault> {
        if self.next_packet % 2 != 0 {
            return Err(RsvFault::OddNextPacket);
        }
        if self.crc_error {
            return Err(RsvFault::CrcError);
        }
        if self.zero {
            return Err(RsvFault::ZeroBitSet);
        }
        if self.rx_byte_count > max_frame_size {
            return Err(RsvFault::Oversize);
        }
        if usize::from(self.rx_byte_count) < MIN_RX_BYTE_COUNT {
            return Err(RsvFault::Undersize);
        }
        if !self.rx_ok {
            return Err(RsvFault::NotOk);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good() -> ReceiveStatusVector {
        ReceiveStatusVector {
            next_packet: 0x0100,
            rx_byte_count: 64,
            rx_ok: true,
            ..ReceiveStatusVector::EMPTY
        }
    }

    #[test]
    fn decode_known_bytes() {
        // next=0x0246, count=0x005A, status: RX_OK | BROADCAST
        let raw = [0x46, 0x02, 0x5A, 0x00, 0x80, 0x02];
        let rsv = ReceiveStatusVector::from_bytes(&raw);
        assert_eq!(rsv.next_packet, 0x0246);
        assert_eq!(rsv.rx_byte_count, 90);
        assert!(rsv.rx_ok);
        assert!(rsv.rx_broadcast);
        assert!(!rsv.rx_multicast);
        assert!(!rsv.crc_error);
        assert!(!rsv.zero);
    }

    #[test]
    fn decode_zero_and_crc_bits() {
        let raw = [0x00, 0x00, 0x40, 0x00, 0x10, 0x80];
        let rsv = ReceiveStatusVector::from_bytes(&raw);
        assert!(rsv.crc_error);
        assert!(rsv.zero);
    }

    #[test]
    fn good_vector_passes() {
        assert_eq!(good().check(1518), Ok(()));
    }

    #[test]
    fn each_fault_is_detected() {
        let odd = ReceiveStatusVector {
            next_packet: 0x0101,
            ..good()
        };
        assert_eq!(odd.check(1518), Err(RsvFault::OddNextPacket));

        let crc = ReceiveStatusVector {
            crc_error: true,
            ..good()
        };
        assert_eq!(crc.check(1518), Err(RsvFault::CrcError));

        let zero = ReceiveStatusVector {
            zero: true,
            ..good()
        };
        assert_eq!(zero.check(1518), Err(RsvFault::ZeroBitSet));

        let big = ReceiveStatusVector {
            rx_byte_count: 1519,
            ..good()
        };
        assert_eq!(big.check(1518), Err(RsvFault::Oversize));

        let small = ReceiveStatusVector {
            rx_byte_count: 17,
            ..good()
        };
        assert_eq!(small.check(1518), Err(RsvFault::Undersize));

        let not_ok = ReceiveStatusVector {
            rx_ok: false,
            ..good()
        };
        assert_eq!(not_ok.check(1518), Err(RsvFault::NotOk));
    }

    #[test]
    fn max_size_frame_accepted() {
        let rsv = ReceiveStatusVector {
            rx_byte_count: 1518,
            ..good()
        };
        assert_eq!(rsv.check(1518), Ok(()));
    }
}
