//! Media driver seam
//!
//! A storage driver (SD card, NVM, RAM disk...) plugs into the media manager
//! by implementing [`MediaDevice`]. All block commands are non-blocking: a
//! start call queues the command and returns a [`CommandHandle`], and the
//! outcome is polled through [`MediaDevice::command_status`].

/// Kind of storage device; selects the volume name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MediaType {
    /// Internal flash
    Nvm,
    /// SD card
    Sd,
    /// MMC / eMMC
    Mmc,
    /// RAM disk
    Ram,
    /// Memory technology device (external flash)
    Mtd,
}

impl MediaType {
    /// Volume name prefix
    pub const fn name(self) -> &'static str {
        match self {
            MediaType::Nvm => "nvm",
            MediaType::Sd => "sd",
            MediaType::Mmc => "mmcblk",
            MediaType::Ram => "ram",
            MediaType::Mtd => "mtd",
        }
    }
}

/// Media object state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MediaState {
    /// Registered, driver not opened yet
    Registered,
    /// Polling for attach/detach
    CheckAttach,
    /// Waiting for the scratch buffer to read sector 0
    ReadFirstSector,
    /// Sector 0 read in flight, then classified
    AnalyzeFs,
    /// Deregistration requested; slot is released on the next poll
    Deregistered,
}

/// Whether a medium is present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttachStatus {
    /// No medium
    #[default]
    Detached,
    /// Medium present
    Attached,
}

/// Status of a queued block command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandStatus {
    /// Finished successfully
    Completed,
    /// Queued, not started
    Queued,
    /// Running
    InProgress,
    /// Failed or not known to the driver
    Unknown,
}

impl CommandStatus {
    /// Whether the command is still queued or running
    #[inline]
    pub const fn is_pending(self) -> bool {
        matches!(self, CommandStatus::Queued | CommandStatus::InProgress)
    }
}

/// Block command completion event reported by a media driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockEvent {
    /// Command completed
    CommandComplete,
    /// Command failed
    CommandError,
}

/// Handle of a queued block command, assigned by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandHandle(u32);

impl CommandHandle {
    /// Wrap a driver-specific handle value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw handle value
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Handle of a registered media object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MediaHandle(pub(crate) u8);

impl MediaHandle {
    /// Disk number used by the file-system facing API
    pub const fn disk(self) -> u16 {
        self.0 as u16
    }
}

/// Block size and count of one access region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GeometryRegion {
    /// Bytes per block
    pub block_size: u32,
    /// Number of blocks
    pub num_blocks: u32,
}

impl GeometryRegion {
    /// Create a region
    pub const fn new(block_size: u32, num_blocks: u32) -> Self {
        Self { block_size, num_blocks }
    }

    /// Total size in bytes
    pub const fn size_bytes(&self) -> u64 {
        self.block_size as u64 * self.num_blocks as u64
    }
}

/// Device geometry, fetched once per attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MediaGeometry {
    /// Read region
    pub read: GeometryRegion,
    /// Write region
    pub write: GeometryRegion,
    /// Erase region
    pub erase: GeometryRegion,
}

/// Storage driver capability set.
///
/// # Buffer contract
///
/// `sector_read`, `sector_write` and `read` borrow the caller's buffer only
/// for the duration of the call, so a driver transfers the data before
/// returning (or stages it internally) and reports completion later through
/// [`MediaDevice::command_status`]. `None` means the command could not be
/// queued and should be retried.
pub trait MediaDevice {
    /// Open the driver; `false` means retry later
    fn open(&mut self) -> bool;

    /// Close the driver
    fn close(&mut self);

    /// Whether a medium is present
    fn is_attached(&mut self) -> bool;

    /// Device geometry
    fn geometry(&mut self) -> MediaGeometry;

    /// Read `num_blocks` read-blocks starting at `block` into `buf`
    fn sector_read(&mut self, buf: &mut [u8], block: u32, num_blocks: u32)
    -> Option<CommandHandle>;

    /// Write `num_blocks` write-blocks starting at `block` from `data`
    fn sector_write(&mut self, data: &[u8], block: u32, num_blocks: u32) -> Option<CommandHandle>;

    /// Byte-addressed read at `address` (relative to [`MediaDevice::address`])
    fn read(&mut self, dst: &mut [u8], address: u32) -> Option<CommandHandle> {
        let _ = (dst, address);
        None
    }

    /// Base address of byte-addressable media
    fn address(&mut self) -> u32 {
        0
    }

    /// Status of a queued command
    fn command_status(&mut self, cmd: CommandHandle) -> CommandStatus;

    /// Drive queued commands forward (for drivers that need polling)
    fn tasks(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_names() {
        assert_eq!(MediaType::Nvm.name(), "nvm");
        assert_eq!(MediaType::Sd.name(), "sd");
        assert_eq!(MediaType::Mmc.name(), "mmcblk");
        assert_eq!(MediaType::Ram.name(), "ram");
        assert_eq!(MediaType::Mtd.name(), "mtd");
    }

    #[test]
    fn pending_statuses() {
        assert!(CommandStatus::Queued.is_pending());
        assert!(CommandStatus::InProgress.is_pending());
        assert!(!CommandStatus::Completed.is_pending());
        assert!(!CommandStatus::Unknown.is_pending());
    }

    #[test]
    fn geometry_size() {
        assert_eq!(GeometryRegion::new(512, 8).size_bytes(), 4096);
    }
}
