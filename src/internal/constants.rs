//! Centralized Constants
//!
//! Single source of truth for the magic numbers used by the receive engine
//! and the media manager.
//!
//! # Organization
//!
//! - **Frame sizes**: Ethernet frame dimensions checked against the RSV
//! - **ENC28J60 memory**: default buffer-memory layout of the controller
//! - **Receive engine**: retry threshold, headroom and RSV size
//! - **Media**: sector size, boot-record offsets and default pool sizes

// =============================================================================
// Frame Sizes
// =============================================================================

/// Maximum Ethernet frame accepted by the receive engine (1500 + 14 header + 4 FCS)
pub const MAX_FRAME_SIZE: usize = 1518;

/// Ethernet header size (dst MAC + src MAC + EtherType)
pub const ETH_HEADER_SIZE: usize = 14;

/// Frame check sequence appended to every received frame
pub const CRC_SIZE: usize = 4;

/// Smallest byte count that still holds a header and an FCS
pub const MIN_RX_BYTE_COUNT: usize = ETH_HEADER_SIZE + CRC_SIZE;

// =============================================================================
// ENC28J60 Buffer Memory
// =============================================================================

/// Last address of the 8 KB controller buffer memory
pub const ENC_MEMORY_END: u16 = 0x1FFF;

/// Default start of the RX ring
pub const DEFAULT_RX_START: u16 = 0x0000;

/// Default end of the RX ring (odd, inclusive)
pub const DEFAULT_RX_END: u16 = 0x19FF;

/// Default start of the TX region, directly after the RX ring
pub const DEFAULT_TX_START: u16 = 0x1A00;

// =============================================================================
// Receive Engine
// =============================================================================

/// Invalid status vectors tolerated before the ring cursor is hard-reset
pub const RX_RETRY_LIMIT: u8 = 3;

/// Leading headroom byte the bus may clobber on a buffer-memory read
pub const RX_SEG_LOAD_OFFSET: usize = 1;

/// Receive status vector size in controller memory
pub const RSV_SIZE: usize = 6;

/// Default packet buffer size (headroom + max frame, rounded up)
pub const DEFAULT_PACKET_BUFFER_SIZE: usize = 1536;

/// Default number of packet buffers in the pool
pub const DEFAULT_RX_PACKETS: usize = 4;

/// Default number of receive descriptors
pub const DEFAULT_RX_DESCRIPTORS: usize = 1;

// =============================================================================
// Media
// =============================================================================

/// Logical sector size seen by the file system layer
pub const SECTOR_SIZE: usize = 512;

/// `log2(SECTOR_SIZE)`
pub const SECTOR_SHIFT: u32 = 9;

/// Default number of media objects
pub const DEFAULT_MEDIA_NUMBER: usize = 2;

/// Default number of volume objects
pub const DEFAULT_VOLUME_NUMBER: usize = 4;

/// Default size of the shared first-sector scratch buffer
pub const DEFAULT_MEDIA_BUFFER_SIZE: usize = 512;

/// Default size of the read-modify-write block buffer
pub const DEFAULT_BLOCK_BUFFER_SIZE: usize = 4096;

/// Default number of polls allowed for one blocking read-modify-write command
pub const DEFAULT_WRITE_POLL_LIMIT: u32 = 100_000;

/// Default delay between read-modify-write polls in microseconds
pub const DEFAULT_WRITE_POLL_INTERVAL_US: u32 = 10;

/// Capacity of a generated volume name (`mmcblk` + letter + digit)
pub const VOLUME_NAME_CAPACITY: usize = 9;

/// Device path prefix accepted by name lookups
pub const DEVICE_PATH_PREFIX: &str = "/dev/";
