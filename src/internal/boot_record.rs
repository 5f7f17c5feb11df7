//! Boot sector layout constants.
//!
//! Offsets into the first 512-byte sector of a device, shared by the MBR and
//! VBR layouts.

#![allow(dead_code)]

/// Boot signature location (bytes 510..=511 hold 0x55, 0xAA)
pub mod signature {
    /// Offset of the first signature byte
    pub const OFFSET: usize = 510;
    /// Expected byte at offset 510
    pub const BYTE0: u8 = 0x55;
    /// Expected byte at offset 511
    pub const BYTE1: u8 = 0xAA;
}

/// Volume boot record jump code
pub mod vbr {
    /// Short jump opcode at byte 0
    pub const JMP_SHORT: u8 = 0xEB;
    /// Accepted jump displacements at byte 1
    pub const JMP_TARGETS: [u8; 3] = [0x3C, 0x58, 0xFE];
    /// NOP at byte 2
    pub const NOP: u8 = 0x90;
    /// File system type string of the FAT32 extended BPB
    pub const FAT32_TYPE_OFFSET: usize = 82;
    /// File system type string of the FAT12/FAT16 extended BPB
    pub const FAT16_TYPE_OFFSET: usize = 54;
    /// Marker expected at the file system type offsets
    pub const FAT_MARKER: &[u8; 3] = b"FAT";
}

/// Master boot record partition table
pub mod mbr {
    /// Offset of the first 16-byte partition entry
    pub const TABLE_OFFSET: usize = 446;
    /// Size of one partition entry
    pub const ENTRY_SIZE: usize = 16;
    /// Number of primary partition entries
    pub const ENTRY_COUNT: usize = 4;
    /// Partition type byte within an entry
    pub const TYPE_FIELD: usize = 4;
    /// Start LBA (u32 LE) within an entry
    pub const START_LBA_FIELD: usize = 8;
    /// Sector count (u32 LE) within an entry
    pub const SECTOR_COUNT_FIELD: usize = 12;
}

/// Byte-addressed MPFS image magic
pub const MPFS_MAGIC: &[u8; 4] = b"MPFS";
