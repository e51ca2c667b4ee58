use std::io::Write;
use std::path::Path;

use log::debug;

use super::data;
use super::directory::{ChecksumPolicy, DirectoryDecoder};
use super::entry::DirectoryEntry;
use super::geometry::VolumeGeometry;
use super::source::{ImageFile, RawSectorSource};
use super::table::AllocationTable;
use crate::error::{FatError, Result};

/// An opened FAT12 volume: the backing image, its geometry and its FAT.
pub struct Fat12Volume<S> {
    source: S,
    geometry: VolumeGeometry,
    fat: AllocationTable,
    checksum_policy: ChecksumPolicy,
}

impl Fat12Volume<ImageFile> {
    /// Open a volume image on disk. The file is reopened for every read.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(ImageFile::open(path)?)
    }
}

impl<S: RawSectorSource> Fat12Volume<S> {
    /// Parse the boot sector and load the allocation table.
    pub fn open(mut source: S) -> Result<Self> {
        let geometry = VolumeGeometry::parse(&mut source)?;
        let fat = AllocationTable::load(&mut source, &geometry)?;
        Ok(Self {
            source,
            geometry,
            fat,
            checksum_policy: ChecksumPolicy::default(),
        })
    }

    pub fn with_checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.checksum_policy = policy;
        self
    }

    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    pub fn fat(&self) -> &AllocationTable {
        &self.fat
    }

    /// Volume label from the boot sector, if one was recorded.
    pub fn volume_label(&self) -> Option<&str> {
        let label = self.geometry.volume_label.as_str();
        if label.is_empty() || label == "NO NAME" {
            None
        } else {
            Some(label)
        }
    }

    /// Re-read the FAT from the backing image.
    pub fn refresh_fat(&mut self) -> Result<()> {
        self.fat.refresh(&mut self.source)
    }

    /// Every live root-directory entry in on-disk order.
    pub fn root_entries(&mut self) -> Result<Vec<DirectoryEntry>> {
        DirectoryDecoder::new(&self.geometry)
            .with_checksum_policy(self.checksum_policy)
            .read_root(&mut self.source)
    }

    /// Look up a root entry by long or 8.3 name, ignoring case (Unicode
    /// lowercase on both sides).
    pub fn find(&mut self, name: &str) -> Result<DirectoryEntry> {
        let wanted = name.to_lowercase();
        self.root_entries()?
            .into_iter()
            .find(|e| e.name.to_lowercase() == wanted || e.short_name.to_lowercase() == wanted)
            .ok_or_else(|| FatError::NotFound(name.to_string()))
    }

    /// The full contents of a file entry.
    pub fn read_file(&mut self, entry: &DirectoryEntry) -> Result<Vec<u8>> {
        ensure_file(entry)?;
        data::read_data(entry, &self.fat, &self.geometry, &mut self.source)
    }

    /// Stream a file entry to `writer`. Returns the number of bytes written.
    pub fn write_file_to<W: Write + ?Sized>(
        &mut self,
        entry: &DirectoryEntry,
        writer: &mut W,
    ) -> Result<u64> {
        ensure_file(entry)?;
        data::write_data(entry, &self.fat, &self.geometry, &mut self.source, writer)
    }

    /// Clusters holding an entry's data, in chain order.
    pub fn clusters_of(&self, entry: &DirectoryEntry) -> Result<Vec<u16>> {
        if entry.file_size == 0 && entry.first_cluster < 2 {
            return Ok(Vec::new());
        }
        self.fat.clusters(entry.first_cluster)
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

fn ensure_file(entry: &DirectoryEntry) -> Result<()> {
    if entry.is_file() {
        Ok(())
    } else {
        debug!("refusing to read {:?} (attributes {:#04x})", entry.name, entry.attributes.0);
        Err(FatError::NotAFile(entry.name.clone()))
    }
}
