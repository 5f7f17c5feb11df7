//! Network packet buffers handed to the upper stack.
//!
//! The receive engine only fills a buffer and sets its length, layer offsets
//! and destination flags. Everything else about the packet belongs to the
//! consumer.

use core::ops::{BitOr, BitOrAssign};

use crate::internal::constants::{ETH_HEADER_SIZE, RX_SEG_LOAD_OFFSET};

/// Index of a packet buffer in the driver's pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketHandle(pub(crate) u8);

impl PacketHandle {
    /// Pool index
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Who currently owns a packet buffer.
///
/// A buffer moves `Free -> InFlight -> Ready -> Consumer -> Free`; a hard
/// reset sends an in-flight buffer straight back to `Free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferOwner {
    /// On the free list
    Free,
    /// Attached to a receive descriptor
    InFlight,
    /// On the ready list
    Ready,
    /// Handed out by packet pickup, waiting for an acknowledge
    Consumer,
}

/// Destination class and ownership flags of a received packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketFlags(u16);

impl PacketFlags {
    /// No flags
    pub const NONE: Self = Self(0);
    /// Packet belongs to the receive path
    pub const RX: Self = Self(1 << 0);
    /// Unicast destination
    pub const UNICAST: Self = Self(1 << 1);
    /// Broadcast destination
    pub const BROADCAST: Self = Self(1 << 2);
    /// Multicast destination
    pub const MULTICAST: Self = Self(1 << 3);

    /// Raw bits
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Whether all bits of `other` are set
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl BitOr for PacketFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PacketFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// One receive buffer.
///
/// `BUF` includes the leading headroom byte at offset 0; the frame starts at
/// [`RX_SEG_LOAD_OFFSET`].
#[derive(Debug)]
pub struct MacPacket<const BUF: usize> {
    pub(crate) buffer: [u8; BUF],
    pub(crate) seg_len: u16,
    pub(crate) mac_layer: usize,
    pub(crate) net_layer: usize,
    pub(crate) flags: PacketFlags,
}

impl<const BUF: usize> MacPacket<BUF> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            buffer: [0; BUF],
            seg_len: 0,
            mac_layer: RX_SEG_LOAD_OFFSET,
            net_layer: RX_SEG_LOAD_OFFSET + ETH_HEADER_SIZE,
            flags: PacketFlags::RX,
        }
    }

    /// Destination slice for a buffer-memory read of `len` bytes (headroom included)
    pub(crate) fn read_target(&mut self, len: usize) -> &mut [u8] {
        &mut self.buffer[..RX_SEG_LOAD_OFFSET + len]
    }

    /// Set payload length and layer offsets after a completed frame read
    pub(crate) fn finish_read(&mut self, payload_len: u16) {
        self.seg_len = payload_len;
        self.mac_layer = RX_SEG_LOAD_OFFSET;
        self.net_layer = self.mac_layer + ETH_HEADER_SIZE;
    }

    /// Clear per-frame state before the buffer is reused
    pub(crate) fn recycle(&mut self) {
        self.seg_len = 0;
        self.flags = PacketFlags::RX;
    }

    /// Network-layer payload length (frame minus Ethernet header and FCS)
    #[inline]
    pub fn seg_len(&self) -> usize {
        usize::from(self.seg_len)
    }

    /// Destination flags
    #[inline]
    pub fn flags(&self) -> PacketFlags {
        self.flags
    }

    /// Offset of the Ethernet header in [`MacPacket::buffer`]
    #[inline]
    pub fn mac_layer_offset(&self) -> usize {
        self.mac_layer
    }

    /// Offset of the network-layer payload in [`MacPacket::buffer`]
    #[inline]
    pub fn net_layer_offset(&self) -> usize {
        self.net_layer
    }

    /// Whole backing buffer, headroom included
    #[inline]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Ethernet header (destination, source, EtherType)
    pub fn ethernet_header(&self) -> &[u8] {
        &self.buffer[self.mac_layer..self.net_layer]
    }

    /// Network-layer payload
    pub fn payload(&self) -> &[u8] {
        &self.buffer[self.net_layer..self.net_layer + self.seg_len()]
    }
}

impl<const BUF: usize> Default for MacPacket<BUF> {
    fn default() -> Self {
        Self::new()
    }
}
