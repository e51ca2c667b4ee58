use std::io::Write;

use log::debug;

use super::entry::DirectoryEntry;
use super::geometry::VolumeGeometry;
use super::source::RawSectorSource;
use super::table::{AllocationTable, EOC};
use crate::error::{FatError, Result};

/// Read a file's contents by following its cluster chain.
///
/// The result is exactly `entry.file_size` bytes; the last cluster is
/// truncated, never padded.
pub fn read_data<S: RawSectorSource + ?Sized>(
    entry: &DirectoryEntry,
    table: &AllocationTable,
    geometry: &VolumeGeometry,
    source: &mut S,
) -> Result<Vec<u8>> {
    // The size field is untrusted until the chain backs it up.
    let limit = table.max_chain_len() * geometry.bytes_per_cluster();
    let mut data = Vec::with_capacity((entry.file_size as usize).min(limit));
    write_data(entry, table, geometry, source, &mut data)?;
    Ok(data)
}

/// Stream a file's contents to `writer` one cluster at a time.
/// Returns the number of bytes written.
pub fn write_data<S: RawSectorSource + ?Sized, W: Write + ?Sized>(
    entry: &DirectoryEntry,
    table: &AllocationTable,
    geometry: &VolumeGeometry,
    source: &mut S,
    writer: &mut W,
) -> Result<u64> {
    let mut remaining = entry.file_size as usize;
    if remaining == 0 {
        return Ok(0);
    }
    if entry.first_cluster < 2 {
        return Err(FatError::chain(
            entry.first_cluster,
            format!("{:?} has {remaining} bytes but no data cluster", entry.name),
        ));
    }

    let bytes_per_cluster = geometry.bytes_per_cluster();
    let mut buf = vec![0u8; bytes_per_cluster];
    let mut written = 0u64;
    let mut last = entry.first_cluster;

    for cluster in table.chain(entry.first_cluster) {
        let cluster = cluster?;
        if cluster == EOC {
            break;
        }
        let len = remaining.min(bytes_per_cluster);
        let offset = geometry.sector_offset(geometry.data_sector(cluster));
        source.read_at(offset, &mut buf[..len])?;
        writer
            .write_all(&buf[..len])
            .map_err(|e| FatError::io(offset, len, e))?;

        remaining -= len;
        written += len as u64;
        last = cluster;
        if remaining == 0 {
            break;
        }
    }

    if remaining > 0 {
        return Err(FatError::chain(
            last,
            format!(
                "chain of {:?} ends after {written} bytes, file size is {}",
                entry.name, entry.file_size
            ),
        ));
    }

    debug!("read {written} bytes of {:?} from cluster {}", entry.name, entry.first_cluster);
    Ok(written)
}
