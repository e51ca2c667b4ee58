pub mod data;
pub mod directory;
pub mod entry;
pub mod geometry;
pub mod source;
pub mod table;
pub mod volume;

use std::path::Path;

pub use data::{read_data, write_data};
pub use directory::{read_root, ChecksumPolicy, DirectoryDecoder};
pub use entry::{Attributes, DirectoryEntry, FatDate, FatTime};
pub use geometry::VolumeGeometry;
pub use source::{ImageFile, RawSectorSource, StreamSource};
pub use table::{AllocationTable, ClusterChain, EOC};
pub use volume::Fat12Volume;

use crate::error::Result;

/// Open a FAT12 image file for browsing.
///
/// The image is not held open; each read reopens it at the needed offset.
pub fn open_image(path: impl AsRef<Path>) -> Result<Fat12Volume<ImageFile>> {
    Fat12Volume::open_path(path)
}
