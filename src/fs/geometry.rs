use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, warn};
use serde::Serialize;

use super::source::RawSectorSource;
use crate::error::{FatError, Result};

/// Sector size used to read the boot sector, and the fallback when the
/// header's own value can't be trusted.
pub const DEFAULT_SECTOR_SIZE: usize = 512;
/// Boot signature marking the extended BPB fields (id, label, type) as present.
pub const EXTENDED_BOOT_SIGNATURE: u8 = 0x29;

const DIR_ENTRY_SIZE: u64 = 32;

/// Layout of a FAT12 volume, derived once from its boot sector.
///
/// All `*_start` values are sector numbers, never byte offsets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeGeometry {
    /// Sector size used for every computation below.
    pub bytes_per_sector: u16,
    /// Sector size exactly as recorded in the header.
    pub header_bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    /// Number of FAT copies, duplicates included.
    pub fat_count: u8,
    pub max_root_entries: u16,
    pub total_sectors: u16,
    pub sectors_per_fat: u16,
    pub sectors_per_track: u16,
    pub head_count: u16,
    pub boot_signature: u8,
    /// Zero unless the boot signature is 0x29.
    pub volume_id: u32,
    /// Empty unless the boot signature is 0x29.
    pub volume_label: String,
    /// Declared filesystem type. A hint only, not a guarantee.
    pub fs_type: String,
    /// Set when the header's sector size was implausible and 512 was
    /// substituted.
    pub degraded: bool,

    pub fat_start: u64,
    pub root_dir_start: u64,
    pub root_dir_sectors: u64,
    pub data_start: u64,
}

impl VolumeGeometry {
    /// Read sector 0 of `source` and derive the volume layout.
    pub fn parse<S: RawSectorSource + ?Sized>(source: &mut S) -> Result<Self> {
        let mut bpb = [0u8; DEFAULT_SECTOR_SIZE];
        source.read_at(0, &mut bpb).map_err(|e| match e {
            FatError::IoFailure { source, .. }
                if source.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                FatError::MalformedBootSector(format!(
                    "image is shorter than one {DEFAULT_SECTOR_SIZE}-byte sector"
                ))
            }
            other => other,
        })?;
        Self::from_boot_sector(&bpb)
    }

    /// Derive the volume layout from the raw bytes of a boot sector.
    pub fn from_boot_sector(bpb: &[u8]) -> Result<Self> {
        if bpb.len() < DEFAULT_SECTOR_SIZE {
            return Err(FatError::MalformedBootSector(format!(
                "boot sector is {} bytes, need {DEFAULT_SECTOR_SIZE}",
                bpb.len()
            )));
        }

        let mut cursor = Cursor::new(&bpb[11..30]);
        let header_bytes_per_sector = read_u16(&mut cursor)?;
        let sectors_per_cluster = read_u8(&mut cursor)?;
        let reserved_sectors = read_u16(&mut cursor)?;
        let fat_count = read_u8(&mut cursor)?;
        let max_root_entries = read_u16(&mut cursor)?;
        let total_sectors = read_u16(&mut cursor)?;
        let _media = read_u8(&mut cursor)?;
        let sectors_per_fat = read_u16(&mut cursor)?;
        let sectors_per_track = read_u16(&mut cursor)?;
        let head_count = read_u16(&mut cursor)?;

        let boot_signature = bpb[38];
        let (volume_id, volume_label, fs_type) = if boot_signature == EXTENDED_BOOT_SIGNATURE {
            let id = u32::from_le_bytes([bpb[39], bpb[40], bpb[41], bpb[42]]);
            (id, ascii_field(&bpb[43..54]), ascii_field(&bpb[54..62]))
        } else {
            (0, String::new(), String::new())
        };

        let degraded = !is_plausible_sector_size(header_bytes_per_sector);
        let bytes_per_sector = if degraded {
            warn!(
                "boot sector declares {header_bytes_per_sector} bytes per sector; \
                 assuming {DEFAULT_SECTOR_SIZE} and marking the volume degraded"
            );
            DEFAULT_SECTOR_SIZE as u16
        } else {
            header_bytes_per_sector
        };

        if sectors_per_cluster == 0 {
            return Err(FatError::MalformedBootSector(
                "sectors per cluster is 0".into(),
            ));
        }
        if fat_count == 0 {
            return Err(FatError::MalformedBootSector("FAT count is 0".into()));
        }
        if sectors_per_fat == 0 {
            return Err(FatError::MalformedBootSector("sectors per FAT is 0".into()));
        }

        let fat_start = reserved_sectors as u64;
        let root_dir_start = fat_count as u64 * sectors_per_fat as u64 + reserved_sectors as u64;
        let root_dir_sectors = max_root_entries as u64 * DIR_ENTRY_SIZE / bytes_per_sector as u64;
        let data_start = root_dir_start + root_dir_sectors;

        if root_dir_sectors == 0 {
            return Err(FatError::MalformedBootSector(format!(
                "{max_root_entries} root entries do not fill a single sector"
            )));
        }
        if total_sectors != 0 && (total_sectors as u64) <= data_start {
            return Err(FatError::MalformedBootSector(format!(
                "data region starts at sector {data_start} but the volume has only {total_sectors} sectors"
            )));
        }

        let geometry = Self {
            bytes_per_sector,
            header_bytes_per_sector,
            sectors_per_cluster,
            reserved_sectors,
            fat_count,
            max_root_entries,
            total_sectors,
            sectors_per_fat,
            sectors_per_track,
            head_count,
            boot_signature,
            volume_id,
            volume_label,
            fs_type,
            degraded,
            fat_start,
            root_dir_start,
            root_dir_sectors,
            data_start,
        };
        debug!(
            "geometry: {} B/sector, {} sectors/cluster, FAT at {}, root at {} ({} sectors), data at {}",
            geometry.bytes_per_sector,
            geometry.sectors_per_cluster,
            geometry.fat_start,
            geometry.root_dir_start,
            geometry.root_dir_sectors,
            geometry.data_start
        );
        Ok(geometry)
    }

    /// Absolute byte offset of a sector.
    pub fn sector_offset(&self, sector: u64) -> u64 {
        sector * self.bytes_per_sector as u64
    }

    pub fn bytes_per_cluster(&self) -> usize {
        self.bytes_per_sector as usize * self.sectors_per_cluster as usize
    }

    /// First sector of a data cluster.
    ///
    /// Clusters 0 and 1 are reserved FAT entries with no data; callers must
    /// reject them before asking for a sector.
    pub fn data_sector(&self, cluster: u16) -> u64 {
        (cluster as u64).saturating_sub(2) * self.sectors_per_cluster as u64 + self.data_start
    }

    /// Number of data clusters the volume can address.
    pub fn total_clusters(&self) -> u32 {
        let data_sectors = (self.total_sectors as u64).saturating_sub(self.data_start);
        (data_sectors / self.sectors_per_cluster as u64) as u32
    }

    /// Size in bytes of one FAT copy.
    pub fn fat_bytes(&self) -> usize {
        self.bytes_per_sector as usize * self.sectors_per_fat as usize
    }

    pub fn has_extended_fields(&self) -> bool {
        self.boot_signature == EXTENDED_BOOT_SIGNATURE
    }
}

fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8> {
    cursor
        .read_u8()
        .map_err(|e| FatError::MalformedBootSector(e.to_string()))
}

fn read_u16(cursor: &mut Cursor<&[u8]>) -> Result<u16> {
    cursor
        .read_u16::<LittleEndian>()
        .map_err(|e| FatError::MalformedBootSector(e.to_string()))
}

fn is_plausible_sector_size(bytes: u16) -> bool {
    bytes.is_power_of_two() && (128..=4096).contains(&bytes)
}

/// Printable ASCII kept, everything else replaced; trailing padding dropped.
fn ascii_field(bytes: &[u8]) -> String {
    let s: String = bytes
        .iter()
        .map(|&b| {
            if (0x20..0x7F).contains(&b) {
                b as char
            } else {
                char::REPLACEMENT_CHARACTER
            }
        })
        .collect();
    s.trim_end().to_string()
}
