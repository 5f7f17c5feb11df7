//! Volume objects and the partition translation table.

use heapless::String;

use crate::internal::constants::VOLUME_NAME_CAPACITY;
use crate::media::boot::{FsKind, FsType};

/// Physical drive and partition number of a volume, as the native FAT layer
/// expects them.
///
/// `partition` counts from 1 for MBR partitions; 0 means "the whole drive"
/// (VBR media and MPFS images).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PartitionRef {
    /// Media index
    pub drive: u8,
    /// Partition number
    pub partition: u8,
}

/// One file-system-bearing partition of a media object
#[derive(Debug, Clone)]
pub struct Volume {
    pub(crate) in_use: bool,
    pub(crate) name: String<VOLUME_NAME_CAPACITY>,
    pub(crate) media: Option<u8>,
    pub(crate) fs_type: FsType,
    pub(crate) start_sector: u32,
    pub(crate) num_sectors: u32,
}

impl Volume {
    /// Unused volume
    pub const fn new() -> Self {
        Self {
            in_use: false,
            name: String::new(),
            media: None,
            fs_type: FsType::NONE,
            start_sector: 0,
            num_sectors: 0,
        }
    }

    /// Whether the volume is populated
    pub fn in_use(&self) -> bool {
        self.in_use
    }

    /// Generated name, e.g. `sda1`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the owning media object
    pub fn media(&self) -> Option<u8> {
        self.media
    }

    /// File system tag
    pub fn fs_type(&self) -> FsType {
        self.fs_type
    }

    /// First sector
    pub fn start_sector(&self) -> u32 {
        self.start_sector
    }

    /// Sector count
    pub fn num_sectors(&self) -> u32 {
        self.num_sectors
    }

    /// Match `name` with or without the device path prefix
    pub(crate) fn matches(&self, name: &str) -> bool {
        let bare = name
            .strip_prefix(crate::internal::constants::DEVICE_PATH_PREFIX)
            .unwrap_or(name);
        self.in_use && self.name.as_str() == bare
    }

    /// Release the volume back to the pool
    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new()
    }
}

/// Volume properties reported to the file system layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VolumeProperty {
    /// File system family
    pub fs_kind: FsKind,
    /// Index in the volume table
    pub volume: u8,
}
