//! Media manager and block-device seam
//!
//! Storage drivers implement [`MediaDevice`] and are registered with a
//! [`MediaManager`], which opens them, watches for media insertion and
//! removal, classifies the first sector and publishes one [`Volume`] per
//! usable partition.

pub mod boot;
pub mod config;
pub mod device;
pub mod manager;
pub mod volume;

pub use boot::{FsAnalysis, FsKind, FsType, PartitionEntry};
pub use config::MediaManagerConfig;
pub use device::{
    AttachStatus, BlockEvent, CommandHandle, CommandStatus, GeometryRegion, MediaDevice,
    MediaGeometry, MediaHandle, MediaState, MediaType,
};
pub use manager::{MediaManager, TransferHandler};
pub use volume::{PartitionRef, Volume, VolumeProperty};
