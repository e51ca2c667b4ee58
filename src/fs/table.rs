//! The FAT12 file allocation table.
//!
//! Entries are 12 bits wide and packed two per three bytes:
//!
//! ```text
//! byte:    0         1         2
//!       [ A7..A0 ][ B3..B0 A11..A8 ][ B11..B4 ]
//! ```
//!
//! Entry `n` lives in the little-endian word at byte `n * 3 / 2`. Even
//! entries take the low 12 bits of that word, odd entries the high 12.

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use super::geometry::VolumeGeometry;
use super::source::RawSectorSource;
use crate::error::{FatError, Result};

/// End-of-chain marker. Only this exact value ends a chain.
pub const EOC: u16 = 0x0FFF;

/// In-memory copy of every FAT on the volume, concatenated.
///
/// Only the first copy is consulted when decoding.
#[derive(Debug, Clone)]
pub struct AllocationTable {
    buffer: Vec<u8>,
    /// Absolute byte offset the table was loaded from.
    offset: u64,
    /// Size of one FAT copy.
    fat_bytes: usize,
    /// Exclusive upper bound on data cluster numbers.
    cluster_limit: u32,
}

impl AllocationTable {
    /// Read all FAT copies starting at the geometry's FAT start sector.
    pub fn load<S: RawSectorSource + ?Sized>(
        source: &mut S,
        geometry: &VolumeGeometry,
    ) -> Result<Self> {
        let fat_bytes = geometry.fat_bytes();
        let offset = geometry.sector_offset(geometry.fat_start);
        let buffer = source.read(offset, fat_bytes * geometry.fat_count as usize)?;

        let capacity = (fat_bytes * 2 / 3) as u32;
        let cluster_limit = match geometry.total_clusters() {
            0 => capacity,
            n => (n + 2).min(capacity),
        };
        debug!(
            "loaded {} FAT copies ({} bytes each) from byte {offset}, cluster limit {cluster_limit}",
            geometry.fat_count, fat_bytes
        );

        Ok(Self {
            buffer,
            offset,
            fat_bytes,
            cluster_limit,
        })
    }

    /// Build a table directly from FAT bytes, for callers that already hold
    /// them. `cluster_limit` bounds valid data cluster numbers.
    pub fn from_bytes(buffer: Vec<u8>, fat_bytes: usize, cluster_limit: u32) -> Self {
        let fat_bytes = fat_bytes.min(buffer.len());
        let cluster_limit = cluster_limit.min((fat_bytes * 2 / 3) as u32);
        Self {
            buffer,
            offset: 0,
            fat_bytes,
            cluster_limit,
        }
    }

    /// Re-read the same byte range from `source`, picking up any change in
    /// the backing image.
    pub fn refresh<S: RawSectorSource + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        source.read_at(self.offset, &mut self.buffer)?;
        debug!("refreshed FAT from byte {}", self.offset);
        Ok(())
    }

    /// Decode the 12-bit entry for `cluster`.
    pub fn decode(&self, cluster: u16) -> Result<u16> {
        let index = cluster as usize * 3 / 2;
        if index + 2 > self.fat_bytes {
            return Err(FatError::chain(
                cluster,
                format!("entry lies beyond the {}-byte FAT", self.fat_bytes),
            ));
        }
        let word = LittleEndian::read_u16(&self.buffer[index..index + 2]);
        if cluster % 2 == 0 {
            Ok(word & 0x0FFF)
        } else {
            Ok(word >> 4)
        }
    }

    /// Walk the chain beginning at `start`.
    ///
    /// Yields `start`, each following cluster, and finally [`EOC`] itself.
    pub fn chain(&self, start: u16) -> ClusterChain<'_> {
        ClusterChain {
            table: self,
            next: Some(start),
            prev: None,
            visited: 0,
        }
    }

    /// Data clusters of the chain at `start`, without the trailing EOC.
    pub fn clusters(&self, start: u16) -> Result<Vec<u16>> {
        let mut out = Vec::new();
        for cluster in self.chain(start) {
            let cluster = cluster?;
            if cluster == EOC {
                break;
            }
            out.push(cluster);
        }
        Ok(out)
    }

    /// Longest chain the volume could hold.
    pub fn max_chain_len(&self) -> usize {
        (self.cluster_limit.saturating_sub(2) as usize).max(1)
    }

    pub fn cluster_limit(&self) -> u32 {
        self.cluster_limit
    }

    pub fn copy_count(&self) -> usize {
        if self.fat_bytes == 0 {
            0
        } else {
            self.buffer.len() / self.fat_bytes
        }
    }

    /// Raw bytes of FAT copy `index`.
    pub fn copy(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.fat_bytes)?;
        self.buffer.get(start..start + self.fat_bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}

/// Lazy walk over one cluster chain. See [`AllocationTable::chain`].
pub struct ClusterChain<'a> {
    table: &'a AllocationTable,
    next: Option<u16>,
    prev: Option<u16>,
    visited: usize,
}

impl ClusterChain<'_> {
    fn fail(&mut self, err: FatError) -> Option<Result<u16>> {
        self.next = None;
        Some(Err(err))
    }
}

impl Iterator for ClusterChain<'_> {
    type Item = Result<u16>;

    fn next(&mut self) -> Option<Self::Item> {
        let cluster = self.next.take()?;
        if cluster == EOC {
            return Some(Ok(EOC));
        }

        if cluster < 2 || cluster as u32 >= self.table.cluster_limit {
            let reason = match self.prev {
                Some(prev) => format!("cluster {prev} links to out-of-range cluster {cluster}"),
                None => format!("chain starts at out-of-range cluster {cluster}"),
            };
            return self.fail(FatError::chain(cluster, reason));
        }

        self.visited += 1;
        if self.visited > self.table.max_chain_len() {
            return self.fail(FatError::chain(
                cluster,
                format!(
                    "chain longer than the volume's {} clusters (cycle?)",
                    self.table.max_chain_len()
                ),
            ));
        }

        match self.table.decode(cluster) {
            Ok(link) => {
                self.prev = Some(cluster);
                self.next = Some(link);
                Some(Ok(cluster))
            }
            Err(e) => self.fail(e),
        }
    }
}
