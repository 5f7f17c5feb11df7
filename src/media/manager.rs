//! Media manager
//!
//! Discovers file-system volumes on registered storage devices without
//! blocking. [`MediaManager::tasks`] is polled from the super-loop and
//! advances one media object per call:
//!
//! ```text
//! Registered -> CheckAttach -> ReadFirstSector -> AnalyzeFs -> CheckAttach
//!   (open)      (attach/detach)  (scratch buffer)   (classify, populate)
//! ```
//!
//! The first-sector scratch buffer is shared by all media objects; only one
//! analysis is in flight at a time. The remaining methods form the block
//! I/O interface used by the file system layer, addressed by disk number.

use embedded_hal::delay::DelayNs;

use crate::error::{MediaError, MediaResult};
use crate::internal::constants::{
    DEFAULT_BLOCK_BUFFER_SIZE, DEFAULT_MEDIA_BUFFER_SIZE, DEFAULT_MEDIA_NUMBER,
    DEFAULT_VOLUME_NUMBER, SECTOR_SHIFT, SECTOR_SIZE,
};
use crate::media::boot::{self, FsAnalysis, FsType};
use crate::media::config::MediaManagerConfig;
use crate::media::device::{
    AttachStatus, BlockEvent, CommandHandle, CommandStatus, MediaDevice, MediaGeometry,
    MediaHandle, MediaState, MediaType,
};
use crate::media::volume::{PartitionRef, Volume, VolumeProperty};

/// Block event callback of the file system layer: event, command, disk
pub type TransferHandler = fn(BlockEvent, CommandHandle, u8);

/// One registered storage device
struct MediaSlot<'d> {
    device: Option<&'d mut dyn MediaDevice>,
    media_type: MediaType,
    state: MediaState,
    attach: AttachStatus,
    open: bool,
    /// Identity letter, `b'a'` for the first device of a type
    id: u8,
    geometry: Option<MediaGeometry>,
    command: Option<CommandHandle>,
    command_status: CommandStatus,
    num_partitions: u8,
    num_volumes: u8,
    disconnect: bool,
}

impl<'d> MediaSlot<'d> {
    fn new() -> Self {
        Self {
            device: None,
            media_type: MediaType::Nvm,
            state: MediaState::Registered,
            attach: AttachStatus::Detached,
            open: false,
            id: 0,
            geometry: None,
            command: None,
            command_status: CommandStatus::Unknown,
            num_partitions: 0,
            num_volumes: 0,
            disconnect: false,
        }
    }

    fn in_use(&self) -> bool {
        self.device.is_some()
    }

    fn device(&mut self) -> MediaResult<&mut (dyn MediaDevice + 'd)> {
        match self.device.as_deref_mut() {
            Some(device) if self.open => Ok(device),
            _ => Err(MediaError::NotOpen),
        }
    }

    fn geometry_or_fetch(&mut self) -> MediaResult<MediaGeometry> {
        if let Some(geometry) = self.geometry {
            return Ok(geometry);
        }
        let geometry = self.device()?.geometry();
        self.geometry = Some(geometry);
        Ok(geometry)
    }

    fn issued(&mut self, cmd: Option<CommandHandle>) -> MediaResult<CommandHandle> {
        let cmd = cmd.ok_or(MediaError::CommandRejected)?;
        self.command = Some(cmd);
        self.command_status = CommandStatus::InProgress;
        Ok(cmd)
    }
}

/// Media manager with fixed pools.
///
/// * `MEDIA` - media objects (registered devices)
/// * `VOLUMES` - volume objects shared by all media
/// * `SCRATCH` - first-sector scratch buffer, at least one sector
/// * `BLOCK` - read-modify-write buffer, at least the largest write block
pub struct MediaManager<
    'd,
    const MEDIA: usize = DEFAULT_MEDIA_NUMBER,
    const VOLUMES: usize = DEFAULT_VOLUME_NUMBER,
    const SCRATCH: usize = DEFAULT_MEDIA_BUFFER_SIZE,
    const BLOCK: usize = DEFAULT_BLOCK_BUFFER_SIZE,
> {
    config: MediaManagerConfig,
    media: [MediaSlot<'d>; MEDIA],
    volumes: [Volume; VOLUMES],
    translation: [PartitionRef; VOLUMES],
    scratch: [u8; SCRATCH],
    scratch_in_use: bool,
    block: [u8; BLOCK],
    next_media: usize,
    transfer_handler: Option<TransferHandler>,
}

impl<'d, const MEDIA: usize, const VOLUMES: usize, const SCRATCH: usize, const BLOCK: usize>
    MediaManager<'d, MEDIA, VOLUMES, SCRATCH, BLOCK>
{
    /// Create a manager with empty pools
    pub fn new(config: MediaManagerConfig) -> Self {
        Self {
            config,
            media: core::array::from_fn(|_| MediaSlot::new()),
            volumes: core::array::from_fn(|_| Volume::new()),
            translation: [PartitionRef::default(); VOLUMES],
            scratch: [0; SCRATCH],
            scratch_in_use: false,
            block: [0; BLOCK],
            next_media: 0,
            transfer_handler: None,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a storage device.
    ///
    /// The identity letter is one past the number of same-type devices in
    /// the slots before the free one, so two SD cards become `sda` and `sdb`.
    pub fn register(
        &mut self,
        device: &'d mut dyn MediaDevice,
        media_type: MediaType,
    ) -> MediaResult<MediaHandle> {
        let mut id = b'a';
        for (index, slot) in self.media.iter_mut().enumerate() {
            if !slot.in_use() {
                *slot = MediaSlot {
                    device: Some(device),
                    media_type,
                    id,
                    ..MediaSlot::new()
                };
                #[cfg(feature = "defmt")]
                defmt::info!("media {}: registered {}{}", index, media_type.name(), id as char);
                return Ok(MediaHandle(index as u8));
            }
            if slot.media_type == media_type {
                id += 1;
            }
        }
        Err(MediaError::PoolExhausted)
    }

    /// Request removal of a device.
    ///
    /// Teardown happens on the device's next turn in [`MediaManager::tasks`].
    pub fn deregister(&mut self, handle: MediaHandle) -> MediaResult<()> {
        let slot = self
            .media
            .get_mut(usize::from(handle.disk()))
            .filter(|slot| slot.in_use())
            .ok_or(MediaError::InvalidHandle)?;
        slot.disconnect = true;
        Ok(())
    }

    // =========================================================================
    // Polled state machine
    // =========================================================================

    /// Advance the next registered media object by one step
    pub fn tasks(&mut self) {
        let Some(index) = self.next_media() else {
            return;
        };

        let slot = &mut self.media[index];
        if slot.disconnect {
            // Deregistered mid-analysis: the read no longer needs the buffer
            if slot.state == MediaState::AnalyzeFs {
                self.scratch_in_use = false;
            }
            slot.state = MediaState::Deregistered;
        }

        match slot.state {
            MediaState::Registered => self.open_media(index),
            MediaState::CheckAttach => self.check_attach(index),
            MediaState::ReadFirstSector => self.read_first_sector(index),
            MediaState::AnalyzeFs => self.analyze_fs(index),
            MediaState::Deregistered => self.release_media(index),
        }
    }

    /// Round robin over in-use slots, starting after the last one served
    fn next_media(&mut self) -> Option<usize> {
        for offset in 0..MEDIA {
            let index = (self.next_media + offset) % MEDIA;
            if self.media[index].in_use() {
                self.next_media = (index + 1) % MEDIA;
                return Some(index);
            }
        }
        None
    }

    fn open_media(&mut self, index: usize) {
        let slot = &mut self.media[index];
        let Some(device) = slot.device.as_deref_mut() else {
            return;
        };
        if device.open() {
            slot.open = true;
            slot.state = MediaState::CheckAttach;
        }
    }

    fn check_attach(&mut self, index: usize) {
        let slot = &mut self.media[index];
        let Some(device) = slot.device.as_deref_mut() else {
            return;
        };

        if device.is_attached() {
            if slot.attach == AttachStatus::Detached {
                #[cfg(feature = "defmt")]
                defmt::info!("media {}: attached", index);
                slot.geometry = Some(device.geometry());
                slot.state = MediaState::ReadFirstSector;
            }
            slot.attach = AttachStatus::Attached;
        } else {
            if slot.attach == AttachStatus::Attached {
                #[cfg(feature = "defmt")]
                defmt::info!("media {}: detached", index);
                release_volumes(&mut self.volumes, index);
                slot.num_volumes = 0;
            }
            slot.attach = AttachStatus::Detached;
        }
    }

    fn read_first_sector(&mut self, index: usize) {
        if self.scratch_in_use {
            return;
        }
        let slot = &mut self.media[index];
        let block_size = slot
            .geometry
            .map_or(SECTOR_SIZE as u32, |g| g.read.block_size)
            .max(1);
        let num_blocks = if (block_size as usize) < SECTOR_SIZE {
            SECTOR_SIZE as u32 / block_size
        } else {
            1
        };

        self.scratch.fill(0);
        let Ok(device) = slot.device() else {
            return;
        };
        let cmd = device.sector_read(&mut self.scratch, 0, num_blocks);
        if slot.issued(cmd).is_ok() {
            self.scratch_in_use = true;
            slot.state = MediaState::AnalyzeFs;
        }
    }

    fn analyze_fs(&mut self, index: usize) {
        let slot = &mut self.media[index];
        let command = slot.command;
        let Ok(device) = slot.device() else {
            return;
        };
        let status = match command {
            Some(cmd) => device.command_status(cmd),
            None => CommandStatus::Unknown,
        };
        if status.is_pending() {
            device.tasks();
            slot.command_status = status;
            return;
        }
        slot.command_status = status;
        self.scratch_in_use = false;

        if status != CommandStatus::Completed {
            #[cfg(feature = "defmt")]
            defmt::warn!("media {}: first sector read failed, retrying", index);
            slot.state = MediaState::ReadFirstSector;
            return;
        }

        let mut analysis = boot::analyze(&self.scratch);
        slot.num_partitions = analysis.num_partitions;
        if !analysis.is_supported() {
            // Keep one blank volume so the medium can be formatted
            analysis.partition_map = u8::from(analysis.is_mbr);
        }
        populate_volumes(
            index,
            slot,
            &mut self.volumes,
            &mut self.translation,
            &analysis,
            &self.scratch,
        );
        slot.state = MediaState::CheckAttach;
    }

    fn release_media(&mut self, index: usize) {
        let slot = &mut self.media[index];
        if slot.attach == AttachStatus::Attached {
            release_volumes(&mut self.volumes, index);
        }
        if let Ok(device) = slot.device() {
            device.close();
        }
        *slot = MediaSlot::new();

        #[cfg(feature = "defmt")]
        defmt::info!("media {}: deregistered", index);
    }

    // =========================================================================
    // Block I/O
    // =========================================================================

    /// Queue a read of `num_sectors` 512-byte sectors.
    ///
    /// Sectors are translated to device blocks when the read block size is
    /// smaller than a sector.
    pub fn sector_read(
        &mut self,
        disk: u16,
        buf: &mut [u8],
        sector: u32,
        num_sectors: u32,
    ) -> MediaResult<CommandHandle> {
        let slot = open_slot(&mut self.media, disk)?;
        let block_size = slot.geometry_or_fetch()?.read.block_size as usize;
        if block_size == 0 {
            return Err(MediaError::UnsupportedBlockSize);
        }

        let (mut block, mut count) = (sector, num_sectors);
        if block_size < SECTOR_SIZE {
            let blocks_per_sector = (SECTOR_SIZE / block_size) as u32;
            block = block.saturating_mul(blocks_per_sector);
            count = count.saturating_mul(blocks_per_sector);
        }
        let cmd = slot.device()?.sector_read(buf, block, count);
        slot.issued(cmd)
    }

    /// Queue a byte-addressed read for MPFS-style media.
    ///
    /// `address` is absolute; it is made relative to [`MediaManager::address_get`].
    pub fn read(&mut self, disk: u16, dst: &mut [u8], address: u32) -> MediaResult<CommandHandle> {
        let slot = open_slot(&mut self.media, disk)?;
        let device = slot.device()?;
        let offset = address
            .checked_sub(device.address())
            .ok_or(MediaError::CommandRejected)?;
        let cmd = device.read(dst, offset);
        slot.issued(cmd)
    }

    /// Write `num_sectors` sectors from `data`.
    ///
    /// Devices with write blocks up to one sector get a single queued write.
    /// Larger write blocks go through a read-modify-write loop over the
    /// block buffer: every block but the last is polled to completion
    /// (driving the device task and waiting `write_poll_interval_us` between
    /// polls); the last write is returned queued like any other command.
    pub fn sector_write<D: DelayNs>(
        &mut self,
        disk: u16,
        sector: u32,
        data: &[u8],
        num_sectors: u32,
        delay: &mut D,
    ) -> MediaResult<CommandHandle> {
        let config = self.config;
        let block_buf = &mut self.block;
        let slot = open_slot(&mut self.media, disk)?;
        let geometry = slot.geometry_or_fetch()?;
        let write_size = geometry.write.block_size as usize;
        let read_size = geometry.read.block_size as usize;
        if write_size == 0 {
            return Err(MediaError::UnsupportedBlockSize);
        }

        if write_size <= SECTOR_SIZE {
            let blocks_per_sector = (SECTOR_SIZE / write_size) as u32;
            let cmd = slot.device()?.sector_write(
                data,
                sector.saturating_mul(blocks_per_sector),
                num_sectors.saturating_mul(blocks_per_sector),
            );
            return slot.issued(cmd);
        }

        if write_size > BLOCK
            || write_size % SECTOR_SIZE != 0
            || read_size == 0
            || write_size % read_size != 0
        {
            return Err(MediaError::UnsupportedBlockSize);
        }
        let needed = usize::try_from(num_sectors)
            .ok()
            .and_then(|n| n.checked_mul(SECTOR_SIZE));
        if num_sectors == 0 || needed.is_none_or(|needed| data.len() < needed) {
            return Err(MediaError::CommandRejected);
        }

        let sectors_per_block = (write_size / SECTOR_SIZE) as u32;
        let reads_per_block = (write_size / read_size) as u32;
        let mut sector = sector;
        let mut remaining = num_sectors;
        let mut offset = 0usize;

        loop {
            let block = sector / sectors_per_block;
            let in_block = sector % sectors_per_block;
            let count = (sectors_per_block - in_block).min(remaining);
            let len = (count as usize) << SECTOR_SHIFT;

            let src: &[u8] = if count == sectors_per_block {
                &data[offset..offset + write_size]
            } else {
                let first_read = block
                    .checked_mul(reads_per_block)
                    .ok_or(MediaError::CommandRejected)?;
                let cmd = slot.device()?.sector_read(
                    &mut block_buf[..write_size],
                    first_read,
                    reads_per_block,
                );
                let cmd = slot.issued(cmd)?;
                wait_for_command(slot, cmd, &config, delay)?;

                let start = (in_block as usize) << SECTOR_SHIFT;
                block_buf[start..start + len].copy_from_slice(&data[offset..offset + len]);
                &block_buf[..write_size]
            };

            let cmd = slot.device()?.sector_write(src, block, 1);
            let cmd = slot.issued(cmd)?;

            remaining -= count;
            if remaining == 0 {
                return Ok(cmd);
            }
            wait_for_command(slot, cmd, &config, delay)?;

            sector = sector
                .checked_add(count)
                .ok_or(MediaError::CommandRejected)?;
            offset += len;
        }
    }

    /// Base address of byte-addressable media
    pub fn address_get(&mut self, disk: u16) -> MediaResult<u32> {
        Ok(open_slot(&mut self.media, disk)?.device()?.address())
    }

    /// Status of a queued command
    pub fn command_status_get(
        &mut self,
        disk: u16,
        cmd: CommandHandle,
    ) -> MediaResult<CommandStatus> {
        let slot = open_slot(&mut self.media, disk)?;
        let status = slot.device()?.command_status(cmd);
        if slot.command == Some(cmd) {
            slot.command_status = status;
        }
        Ok(status)
    }

    /// Geometry of an attached device
    pub fn geometry_get(&self, disk: u16) -> Option<MediaGeometry> {
        let slot = self.media.get(usize::from(disk))?;
        if slot.attach == AttachStatus::Detached {
            return None;
        }
        slot.geometry
    }

    /// Drive the device's own task function while the file system waits on a
    /// command
    pub fn transfer_task(&mut self, disk: u16) {
        if let Some(device) = self
            .media
            .get_mut(usize::from(disk))
            .and_then(|slot| slot.device.as_deref_mut())
        {
            device.tasks();
        }
    }

    // =========================================================================
    // Volume lookup
    // =========================================================================

    /// Whether the medium behind volume `name` (`sda1` or `/dev/sda1`) is present
    pub fn media_status_get(&mut self, name: &str) -> bool {
        let Some(media) = self
            .volumes
            .iter()
            .find(|volume| volume.matches(name))
            .and_then(Volume::media)
        else {
            return false;
        };
        self.media
            .get_mut(usize::from(media))
            .and_then(|slot| slot.device.as_deref_mut())
            .is_some_and(|device| device.is_attached())
    }

    /// File system family and volume number of volume `name`
    pub fn volume_property_get(&self, name: &str) -> Option<VolumeProperty> {
        self.volumes
            .iter()
            .position(|volume| volume.matches(name))
            .map(|index| VolumeProperty {
                fs_kind: self.volumes[index].fs_type.kind(),
                volume: index as u8,
            })
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Register the file system layer's block event callback
    pub fn register_transfer_handler(&mut self, handler: TransferHandler) {
        self.transfer_handler = Some(handler);
    }

    /// Block event from a media driver.
    ///
    /// Updates the media object's command status and forwards the event to
    /// the transfer handler.
    pub fn handle_event(&mut self, disk: u16, event: BlockEvent, cmd: CommandHandle) {
        let Some(slot) = self
            .media
            .get_mut(usize::from(disk))
            .filter(|slot| slot.in_use())
        else {
            return;
        };
        slot.command_status = match event {
            BlockEvent::CommandComplete => CommandStatus::Completed,
            BlockEvent::CommandError => CommandStatus::Unknown,
        };
        if let Some(handler) = self.transfer_handler {
            handler(event, cmd, disk as u8);
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// State of a registered media object
    pub fn media_state(&self, handle: MediaHandle) -> Option<MediaState> {
        self.slot(handle).map(|slot| slot.state)
    }

    /// Attach status of a registered media object
    pub fn attach_status(&self, handle: MediaHandle) -> Option<AttachStatus> {
        self.slot(handle).map(|slot| slot.attach)
    }

    /// Volumes populated from a media object
    pub fn num_volumes(&self, handle: MediaHandle) -> Option<u8> {
        self.slot(handle).map(|slot| slot.num_volumes)
    }

    /// Partitions found on a media object by the last analysis
    pub fn num_partitions(&self, handle: MediaHandle) -> Option<u8> {
        self.slot(handle).map(|slot| slot.num_partitions)
    }

    /// Status of the media object's last command
    pub fn last_command_status(&self, handle: MediaHandle) -> Option<CommandStatus> {
        self.slot(handle).map(|slot| slot.command_status)
    }

    /// Volume table
    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    /// Volume `index`
    pub fn volume(&self, index: usize) -> Option<&Volume> {
        self.volumes.get(index)
    }

    /// Drive/partition pair of volume `index`
    pub fn translation(&self, index: usize) -> Option<PartitionRef> {
        self.translation.get(index).copied()
    }

    /// Whether a first-sector analysis holds the scratch buffer
    pub fn scratch_in_use(&self) -> bool {
        self.scratch_in_use
    }

    fn slot(&self, handle: MediaHandle) -> Option<&MediaSlot<'d>> {
        self.media
            .get(usize::from(handle.disk()))
            .filter(|slot| slot.in_use())
    }
}

fn open_slot<'a, 'd>(
    media: &'a mut [MediaSlot<'d>],
    disk: u16,
) -> MediaResult<&'a mut MediaSlot<'d>> {
    let slot = media
        .get_mut(usize::from(disk))
        .ok_or(MediaError::InvalidDisk)?;
    if !slot.in_use() || !slot.open {
        return Err(MediaError::NotOpen);
    }
    Ok(slot)
}

/// Poll `cmd` to completion within the configured budget
fn wait_for_command<D: DelayNs>(
    slot: &mut MediaSlot<'_>,
    cmd: CommandHandle,
    config: &MediaManagerConfig,
    delay: &mut D,
) -> MediaResult<()> {
    for _ in 0..config.write_poll_limit {
        let status = slot.device()?.command_status(cmd);
        slot.command_status = status;
        match status {
            CommandStatus::Completed => return Ok(()),
            CommandStatus::Unknown => return Err(MediaError::CommandFailed),
            CommandStatus::Queued | CommandStatus::InProgress => {
                slot.device()?.tasks();
                delay.delay_us(config.write_poll_interval_us);
            }
        }
    }
    Err(MediaError::Timeout)
}

fn release_volumes(volumes: &mut [Volume], media: usize) {
    for volume in volumes
        .iter_mut()
        .filter(|volume| volume.in_use && volume.media == Some(media as u8))
    {
        volume.clear();
    }
}

/// Claim free volumes for the partitions in `analysis`.
///
/// One volume per set bit of the partition map, or a single volume when the
/// map is empty (VBR, MPFS or blank media).
fn populate_volumes(
    index: usize,
    slot: &mut MediaSlot<'_>,
    volumes: &mut [Volume],
    translation: &mut [PartitionRef],
    analysis: &FsAnalysis,
    sector: &[u8],
) {
    let mut map = analysis.partition_map;
    let drive = index as u8;

    for (volume_index, volume) in volumes.iter_mut().enumerate() {
        if volume.in_use {
            continue;
        }

        slot.num_volumes += 1;
        volume.name.clear();
        let _ = volume.name.push_str(slot.media_type.name());
        let _ = volume.name.push(slot.id as char);
        let _ = volume.name.push((b'0' + slot.num_volumes) as char);
        volume.media = Some(drive);
        volume.fs_type = analysis.fs_type;
        volume.start_sector = 0;
        volume.num_sectors = 0;

        if analysis.fs_type == FsType::MPFS {
            translation[volume_index] = PartitionRef { drive, partition: 0 };
        } else {
            let mut partition = 0u8;
            if map != 0 {
                partition = map.trailing_zeros() as u8;
                map &= !(1 << partition);
                if analysis.is_supported() {
                    if let Some(entry) = boot::partition_entry(sector, usize::from(partition)) {
                        volume.fs_type = entry.fs_type;
                        volume.start_sector = entry.start_sector;
                        volume.num_sectors = entry.num_sectors;
                    }
                }
            } else if analysis.is_supported() {
                // VBR: the volume spans the whole device
                let bytes = slot.geometry.map_or(0, |g| g.read.size_bytes());
                volume.num_sectors = (bytes >> SECTOR_SHIFT).min(u64::from(u32::MAX)) as u32;
            }
            translation[volume_index] = PartitionRef {
                drive,
                partition: if analysis.is_mbr { partition + 1 } else { 0 },
            };
        }
        volume.in_use = true;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "media {}: volume {} ({=u8:#x}) populated",
            index,
            volume.name.as_str(),
            volume.fs_type.0
        );

        if map == 0 {
            break;
        }
    }
}
