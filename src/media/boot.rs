//! Boot sector classification
//!
//! Decides from the first sector of a device whether it carries a volume
//! boot record, a master boot record with FAT partitions, an MPFS image or
//! nothing usable. The classifier only looks at fixed offsets; FAT semantics
//! are left to the file system.

use crate::internal::boot_record::{MPFS_MAGIC, mbr, signature, vbr};

/// File system type tag.
///
/// For MBR partitions this is the partition type byte. VBR media report
/// [`FsType::FAT32`] or [`FsType::FAT16`], MPFS images report
/// [`FsType::MPFS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FsType(pub u8);

impl FsType {
    /// FAT12
    pub const FAT12: Self = Self(0x01);
    /// FAT16 (also reported for FAT12/16 volume boot records)
    pub const FAT16: Self = Self(0x06);
    /// FAT32 (CHS)
    pub const FAT32: Self = Self(0x0B);
    /// MPFS image
    pub const MPFS: Self = Self(b'M');
    /// No or unsupported file system
    pub const NONE: Self = Self(0xFF);

    /// Whether the tag is one of the recognized FAT partition types
    pub const fn is_fat(self) -> bool {
        matches!(self.0, 0x01 | 0x04 | 0x05 | 0x06 | 0x07 | 0x0B | 0x0C | 0x0E | 0x0F)
    }

    /// File system family
    pub const fn kind(self) -> FsKind {
        if self.is_fat() {
            FsKind::Fat
        } else if self.0 == Self::MPFS.0 {
            FsKind::Mpfs
        } else {
            FsKind::Unsupported
        }
    }
}

/// File system family reported to the file system layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FsKind {
    /// FAT12/16/32
    Fat,
    /// MPFS
    Mpfs,
    /// Nothing usable; the volume can still be formatted
    Unsupported,
}

/// Result of classifying a first sector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FsAnalysis {
    /// File system tag; any non-NONE value for an MBR with FAT partitions
    pub fs_type: FsType,
    /// Number of usable partitions
    pub num_partitions: u8,
    /// Sector 0 is a master boot record
    pub is_mbr: bool,
    /// Bit `n` set when MBR entry `n` holds a FAT partition
    pub partition_map: u8,
}

impl FsAnalysis {
    /// Whether a usable file system was found
    pub const fn is_supported(&self) -> bool {
        self.fs_type.0 != FsType::NONE.0
    }

    const UNSUPPORTED: Self = Self {
        fs_type: FsType::NONE,
        num_partitions: 0,
        is_mbr: false,
        partition_map: 0,
    };
}

/// One MBR partition table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PartitionEntry {
    /// Partition type byte
    pub fs_type: FsType,
    /// First sector
    pub start_sector: u32,
    /// Number of sectors
    pub num_sectors: u32,
}

/// Read MBR partition entry `index` (0..4) from `sector`
pub fn partition_entry(sector: &[u8], index: usize) -> Option<PartitionEntry> {
    if index >= mbr::ENTRY_COUNT {
        return None;
    }
    let base = mbr::TABLE_OFFSET + index * mbr::ENTRY_SIZE;
    let entry = sector.get(base..base + mbr::ENTRY_SIZE)?;
    let u32_at = |off: usize| {
        u32::from_le_bytes([entry[off], entry[off + 1], entry[off + 2], entry[off + 3]])
    };
    Some(PartitionEntry {
        fs_type: FsType(entry[mbr::TYPE_FIELD]),
        start_sector: u32_at(mbr::START_LBA_FIELD),
        num_sectors: u32_at(mbr::SECTOR_COUNT_FIELD),
    })
}

fn has_boot_signature(sector: &[u8]) -> bool {
    sector.get(signature::OFFSET..signature::OFFSET + 2)
        == Some(&[signature::BYTE0, signature::BYTE1][..])
}

fn is_vbr(sector: &[u8]) -> bool {
    sector[0] == vbr::JMP_SHORT && vbr::JMP_TARGETS.contains(&sector[1]) && sector[2] == vbr::NOP
}

fn has_fat_marker(sector: &[u8], offset: usize) -> bool {
    sector.get(offset..offset + vbr::FAT_MARKER.len()) == Some(&vbr::FAT_MARKER[..])
}

/// Classify the first sector of a device.
///
/// An MPFS image is recognized by its magic whether or not a boot signature
/// is present. Otherwise a boot signature is required: a sector starting
/// with a known jump instruction is a VBR (one implicit partition), anything
/// else is an MBR whose four entries are scanned for FAT partition types.
pub fn analyze(sector: &[u8]) -> FsAnalysis {
    if sector.starts_with(MPFS_MAGIC) {
        return FsAnalysis {
            fs_type: FsType::MPFS,
            num_partitions: 1,
            is_mbr: false,
            partition_map: 0,
        };
    }

    if !has_boot_signature(sector) {
        return FsAnalysis::UNSUPPORTED;
    }

    if is_vbr(sector) {
        let fs_type = if has_fat_marker(sector, vbr::FAT32_TYPE_OFFSET) {
            FsType::FAT32
        } else if has_fat_marker(sector, vbr::FAT16_TYPE_OFFSET) {
            FsType::FAT16
        } else {
            FsType::NONE
        };
        return FsAnalysis {
            fs_type,
            num_partitions: 1,
            is_mbr: false,
            partition_map: 0,
        };
    }

    let mut analysis = FsAnalysis {
        is_mbr: true,
        ..FsAnalysis::UNSUPPORTED
    };
    for index in 0..mbr::ENTRY_COUNT {
        let fat = partition_entry(sector, index).is_some_and(|entry| entry.fs_type.is_fat());
        if fat {
            analysis.partition_map |= 1 << index;
            analysis.num_partitions += 1;
        }
    }
    if analysis.partition_map != 0 {
        analysis.fs_type = FsType::FAT12;
    }
    analysis
}
