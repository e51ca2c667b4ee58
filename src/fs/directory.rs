//! Root-directory decoding with VFAT long filename reconstruction.
//!
//! A long name is stored as up to 20 fragment slots directly in front of the
//! short entry that carries the file's metadata. The fragment holding the
//! *end* of the name is stored first and is flagged with bit 6 of its first
//! byte; its low 6 bits give the fragment count. Sector boundaries ignore all
//! of this, so a run of fragments (and its short entry) routinely continues
//! into the following sector.
//!
//! The decoder walks the root directory one sector at a time through a
//! [`SectorWindow`]: two owned sector buffers, "current" and "next". Slot
//! positions are always indices relative to the start of "current". When a
//! run ends past the current sector the index is left pointing into "next",
//! and [`rehome`] brings it back after the window slides.

use std::borrow::Cow;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};

use super::entry::{
    DirectoryEntry, ATTR_LONG_NAME, ATTR_OFFSET, DELETED_MARKER, DIR_ENTRY_SIZE, EMPTY_MARKER,
};
use super::geometry::VolumeGeometry;
use super::source::RawSectorSource;
use crate::error::{FatError, Result};

/// Byte offsets of the 13 UTF-16 code units inside a fragment slot.
const LONG_NAME_CHAR_OFFSETS: [usize; 13] = [1, 3, 5, 7, 9, 14, 16, 18, 20, 22, 24, 28, 30];
const LAST_LONG_ENTRY: u8 = 0x40;
const LONG_ENTRY_INDEX_MASK: u8 = 0x3F;
const CHECKSUM_OFFSET: usize = 13;

/// What to do when a fragment's checksum byte doesn't match its short entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// Accept the long name anyway (legacy behavior). Mismatches are logged.
    #[default]
    Ignore,
    /// Fail the listing with [`FatError::LongNameChecksum`].
    Strict,
}

/// Reads the root directory of a FAT12 volume.
pub struct DirectoryDecoder<'g> {
    geometry: &'g VolumeGeometry,
    checksum_policy: ChecksumPolicy,
}

/// Read the root directory with the default (permissive) checksum policy.
pub fn read_root<S: RawSectorSource + ?Sized>(
    source: &mut S,
    geometry: &VolumeGeometry,
) -> Result<Vec<DirectoryEntry>> {
    DirectoryDecoder::new(geometry).read_root(source)
}

impl<'g> DirectoryDecoder<'g> {
    pub fn new(geometry: &'g VolumeGeometry) -> Self {
        Self {
            geometry,
            checksum_policy: ChecksumPolicy::default(),
        }
    }

    pub fn with_checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.checksum_policy = policy;
        self
    }

    /// Decode every live entry of the root directory, in on-disk order.
    ///
    /// Stops at the first empty slot or the end of the root-directory region.
    /// Any malformed long-name run aborts the whole listing.
    pub fn read_root<S: RawSectorSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<Vec<DirectoryEntry>> {
        let sector_size = self.geometry.bytes_per_sector as usize;
        let mut window = SectorWindow::open(source, self.geometry)?;
        let mut entries = Vec::new();
        let mut index = 0usize;

        'scan: loop {
            while index < sector_size {
                let slot = window.slot(source, index)?.ok_or_else(|| {
                    window.malformed(index, "slot lies outside the root directory")
                })?;

                if slot[0] == EMPTY_MARKER {
                    break 'scan;
                } else if slot[0] == DELETED_MARKER {
                    index += DIR_ENTRY_SIZE;
                } else if slot[ATTR_OFFSET] == ATTR_LONG_NAME {
                    if slot[0] & LAST_LONG_ENTRY == 0 {
                        let (sector, offset) = window.locate(index);
                        return Err(FatError::UnexpectedEntryOrder { sector, offset });
                    }
                    let (entry, consumed) = self.decode_long_run(source, &window, index, &slot)?;
                    debug!("root entry {:?} ({} slots)", entry.name, consumed / DIR_ENTRY_SIZE);
                    entries.push(entry);
                    index += consumed;
                } else {
                    let entry = DirectoryEntry::parse(&slot, None)
                        .ok_or_else(|| window.malformed(index, "unreadable short entry"))?;
                    debug!("root entry {:?}", entry.name);
                    entries.push(entry);
                    index += DIR_ENTRY_SIZE;
                }
            }

            while index >= sector_size {
                if !window.slide(source)? {
                    break 'scan;
                }
                index = rehome(index, sector_size);
            }
        }

        debug!("root directory: {} entries", entries.len());
        Ok(entries)
    }

    /// Decode the fragment run whose terminal fragment sits at `index`, plus
    /// the short entry after it. Returns the entry and the bytes consumed.
    fn decode_long_run<S: RawSectorSource + ?Sized>(
        &self,
        source: &mut S,
        window: &SectorWindow,
        index: usize,
        terminal: &[u8; DIR_ENTRY_SIZE],
    ) -> Result<(DirectoryEntry, usize)> {
        let count = (terminal[0] & LONG_ENTRY_INDEX_MASK) as usize;
        if count == 0 {
            return Err(window.malformed(index, "final long-name entry declares no fragments"));
        }

        let mut units: Vec<u16> = Vec::with_capacity(count * LONG_NAME_CHAR_OFFSETS.len());
        let mut checksums = Vec::with_capacity(count);

        // The slot nearest the short entry holds the start of the name.
        for i in (0..count).rev() {
            let offset = index + DIR_ENTRY_SIZE * i;
            let slot = window.slot(source, offset)?.ok_or_else(|| {
                window.malformed(offset, "long-name run extends past the root directory")
            })?;
            if slot[ATTR_OFFSET] != ATTR_LONG_NAME {
                return Err(window.malformed(
                    offset,
                    format!("fragment {} of {count} is not a long-name entry", i + 1),
                ));
            }
            for &char_offset in &LONG_NAME_CHAR_OFFSETS {
                let unit = LittleEndian::read_u16(&slot[char_offset..char_offset + 2]);
                if unit == 0 {
                    break;
                }
                units.push(unit);
            }
            checksums.push((offset, slot[CHECKSUM_OFFSET]));
        }

        let short_offset = index + DIR_ENTRY_SIZE * count;
        let slot = window.slot(source, short_offset)?.ok_or_else(|| {
            window.malformed(short_offset, "long name has no short entry before the end of the root directory")
        })?;
        let name = assemble_name(&units);
        let entry = DirectoryEntry::parse(&slot, Some(name))
            .ok_or_else(|| window.malformed(short_offset, "long name is not followed by a short entry"))?;

        let expected = entry.checksum();
        if let Some(&(offset, found)) = checksums.iter().find(|&&(_, sum)| sum != expected) {
            match self.checksum_policy {
                ChecksumPolicy::Strict => {
                    let (sector, offset) = window.locate(offset);
                    return Err(FatError::LongNameChecksum {
                        sector,
                        offset,
                        expected,
                        found,
                    });
                }
                ChecksumPolicy::Ignore => warn!(
                    "long name {:?} carries checksum {found:#04x}, short entry {:?} expects {expected:#04x}; accepting",
                    entry.name, entry.short_name
                ),
            }
        }

        Ok((entry, (count + 1) * DIR_ENTRY_SIZE))
    }
}

/// Join fragment code units and strip blanks, control characters and 0xFFFF
/// padding from both ends.
fn assemble_name(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
        .trim_matches(|c: char| c.is_whitespace() || c.is_control() || c == '\u{FFFF}')
        .to_string()
}

/// Re-express an index that ran into "next" relative to the new "current"
/// after the window slides by one sector.
pub(crate) fn rehome(index: usize, sector_size: usize) -> usize {
    index - sector_size
}

/// Two owned sector buffers over the root-directory region.
struct SectorWindow {
    buffers: [Vec<u8>; 2],
    /// Which of `buffers` is "current"; the other is "next".
    head: usize,
    has_next: bool,
    /// Absolute sector number held in "current".
    current_sector: u64,
    /// Last sector (inclusive) of the root directory.
    last_sector: u64,
    sector_size: usize,
    /// Byte offset of sector 0.
    bytes_per_sector: u64,
}

impl SectorWindow {
    fn open<S: RawSectorSource + ?Sized>(source: &mut S, geometry: &VolumeGeometry) -> Result<Self> {
        let sector_size = geometry.bytes_per_sector as usize;
        let first = geometry.root_dir_start;
        let last_sector = first + geometry.root_dir_sectors - 1;

        let mut window = Self {
            buffers: [vec![0u8; sector_size], vec![0u8; sector_size]],
            head: 0,
            has_next: first < last_sector,
            current_sector: first,
            last_sector,
            sector_size,
            bytes_per_sector: geometry.bytes_per_sector as u64,
        };
        window.load(source, 0, first)?;
        if window.has_next {
            window.load(source, 1, first + 1)?;
        }
        Ok(window)
    }

    fn load<S: RawSectorSource + ?Sized>(&mut self, source: &mut S, buffer: usize, sector: u64) -> Result<()> {
        source.read_at(sector * self.bytes_per_sector, &mut self.buffers[buffer])
    }

    /// Advance one sector. Returns `false` once the root directory is exhausted.
    fn slide<S: RawSectorSource + ?Sized>(&mut self, source: &mut S) -> Result<bool> {
        if !self.has_next {
            return Ok(false);
        }
        self.head ^= 1;
        self.current_sector += 1;
        self.has_next = self.current_sector < self.last_sector;
        if self.has_next {
            let spare = self.head ^ 1;
            self.load(source, spare, self.current_sector + 1)?;
        }
        Ok(true)
    }

    /// Bytes of the sector `ahead` sectors past "current", or `None` past the
    /// end of the root directory. Sectors beyond "next" are read on the spot
    /// and not retained.
    fn sector<S: RawSectorSource + ?Sized>(&self, source: &mut S, ahead: usize) -> Result<Option<Cow<'_, [u8]>>> {
        let sector = self.current_sector + ahead as u64;
        if sector > self.last_sector {
            return Ok(None);
        }
        match ahead {
            0 => Ok(Some(Cow::Borrowed(&self.buffers[self.head]))),
            1 => Ok(Some(Cow::Borrowed(&self.buffers[self.head ^ 1]))),
            _ => {
                let bytes = source.read(sector * self.bytes_per_sector, self.sector_size)?;
                Ok(Some(Cow::Owned(bytes)))
            }
        }
    }

    /// Copy the 32-byte slot at `index` (relative to "current"), stitching it
    /// together across a sector boundary when needed.
    fn slot<S: RawSectorSource + ?Sized>(&self, source: &mut S, index: usize) -> Result<Option<[u8; DIR_ENTRY_SIZE]>> {
        let mut out = [0u8; DIR_ENTRY_SIZE];
        let mut filled = 0;
        while filled < DIR_ENTRY_SIZE {
            let pos = index + filled;
            let within = pos % self.sector_size;
            let take = (DIR_ENTRY_SIZE - filled).min(self.sector_size - within);
            let Some(bytes) = self.sector(source, pos / self.sector_size)? else {
                return Ok(None);
            };
            out[filled..filled + take].copy_from_slice(&bytes[within..within + take]);
            filled += take;
        }
        Ok(Some(out))
    }

    /// Absolute sector and in-sector offset of a window-relative index.
    fn locate(&self, index: usize) -> (u64, usize) {
        (
            self.current_sector + (index / self.sector_size) as u64,
            index % self.sector_size,
        )
    }

    fn malformed(&self, index: usize, reason: impl Into<String>) -> FatError {
        let (sector, offset) = self.locate(index);
        FatError::MalformedLongNameChain {
            sector,
            offset,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::entry::short_name_checksum;
    use crate::fs::source::StreamSource;

    const SECTOR: usize = 512;
    const ROOT_START: usize = 3;

    /// Geometry with a 4-sector root directory at sector 3.
    fn make_geometry() -> VolumeGeometry {
        let mut bpb = [0u8; 512];
        bpb[11..13].copy_from_slice(&(SECTOR as u16).to_le_bytes());
        bpb[13] = 1;
        bpb[14..16].copy_from_slice(&1u16.to_le_bytes());
        bpb[16] = 2;
        bpb[17..19].copy_from_slice(&64u16.to_le_bytes());
        bpb[19..21].copy_from_slice(&64u16.to_le_bytes());
        bpb[22..24].copy_from_slice(&1u16.to_le_bytes());
        let g = VolumeGeometry::from_boot_sector(&bpb).unwrap();
        assert_eq!(g.root_dir_start, ROOT_START as u64);
        assert_eq!(g.root_dir_sectors, 4);
        g
    }

    fn make_short(name: &[u8; 11], cluster: u16, size: u32) -> [u8; 32] {
        let mut slot = [0u8; 32];
        slot[0..11].copy_from_slice(name);
        slot[11] = 0x20;
        slot[26..28].copy_from_slice(&cluster.to_le_bytes());
        slot[28..32].copy_from_slice(&size.to_le_bytes());
        slot
    }

    /// Fragment slots for `name` in on-disk order (terminal fragment first).
    fn make_long(name: &str, short: &[u8; 11]) -> Vec<[u8; 32]> {
        let mut units: Vec<u16> = name.encode_utf16().collect();
        let count = units.len().div_ceil(13);
        if units.len() % 13 != 0 {
            units.push(0);
        }
        units.resize(count * 13, 0xFFFF);

        let checksum = short_name_checksum(short);
        let mut slots = Vec::new();
        for seq in (1..=count).rev() {
            let mut slot = [0u8; 32];
            slot[0] = seq as u8 | if seq == count { LAST_LONG_ENTRY } else { 0 };
            slot[11] = ATTR_LONG_NAME;
            slot[13] = checksum;
            let chunk = &units[(seq - 1) * 13..seq * 13];
            for (unit, &off) in chunk.iter().zip(LONG_NAME_CHAR_OFFSETS.iter()) {
                slot[off..off + 2].copy_from_slice(&unit.to_le_bytes());
            }
            slots.push(slot);
        }
        slots
    }

    /// Image with the given slots laid out from byte `start` of the root directory.
    fn make_image(start: usize, slots: &[[u8; 32]]) -> StreamSource<std::io::Cursor<Vec<u8>>> {
        let mut image = vec![0u8; 64 * SECTOR];
        let mut pos = ROOT_START * SECTOR + start;
        for slot in slots {
            image[pos..pos + 32].copy_from_slice(slot);
            pos += 32;
        }
        StreamSource::from_bytes(image)
    }

    fn deleted_padding(count: usize) -> Vec<[u8; 32]> {
        let mut slot = make_short(b"GONE    TXT", 0, 0);
        slot[0] = DELETED_MARKER;
        vec![slot; count]
    }

    #[test]
    fn test_empty_directory() {
        let g = make_geometry();
        let mut src = make_image(0, &[]);
        assert!(read_root(&mut src, &g).unwrap().is_empty());
    }

    #[test]
    fn test_short_entry_without_long_name() {
        let g = make_geometry();
        let mut src = make_image(0, &[make_short(b"README  TXT", 2, 10), make_short(b"NOEXT      ", 3, 0)]);
        let entries = read_root(&mut src, &g).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["README.TXT", "NOEXT"]);
    }

    #[test]
    fn test_two_fragment_name_in_one_sector() {
        let g = make_geometry();
        let short = *b"ALONGN~1TXT";
        let mut slots = make_long("a longer name here.txt", &short);
        assert_eq!(slots.len(), 2);
        slots.push(make_short(&short, 5, 99));
        let mut src = make_image(0, &slots);

        let entries = read_root(&mut src, &g).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a longer name here.txt");
        assert_eq!(entries[0].short_name, "ALONGN~1.TXT");
        assert_eq!(entries[0].first_cluster, 5);
        assert_eq!(entries[0].file_size, 99);
    }

    #[test]
    fn test_run_straddling_sector_boundary() {
        let g = make_geometry();
        let short = *b"STRADD~1DAT";
        let name = "straddling the sector boundary.dat";
        let mut run = make_long(name, &short);
        run.push(make_short(&short, 7, 4096));

        let mut src = make_image(0, &run);
        let inside = read_root(&mut src, &g).unwrap();

        // 15 deleted slots push the run to byte 480.
        let mut slots = deleted_padding(15);
        slots.extend(run.iter().copied());
        slots.push(make_short(b"AFTER   TXT", 9, 1));
        let mut src = make_image(0, &slots);
        let across = read_root(&mut src, &g).unwrap();

        assert_eq!(across.len(), 2);
        assert_eq!(across[0], inside[0]);
        assert_eq!(across[0].name, name);
        assert_eq!(across[1].name, "AFTER.TXT");
    }

    #[test]
    fn test_short_entry_alone_in_next_sector() {
        let g = make_geometry();
        let short = *b"EDGE    TXT";
        let mut slots = deleted_padding(14);
        slots.extend(make_long("edge case file.txt", &short));
        assert_eq!(slots.len(), 16);
        slots.push(make_short(&short, 2, 3));
        let mut src = make_image(0, &slots);

        let entries = read_root(&mut src, &g).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "edge case file.txt");
    }

    #[test]
    fn test_run_spanning_three_sectors() {
        let mut bpb = [0u8; 512];
        bpb[11..13].copy_from_slice(&128u16.to_le_bytes());
        bpb[13] = 1;
        bpb[14..16].copy_from_slice(&4u16.to_le_bytes());
        bpb[16] = 1;
        bpb[17..19].copy_from_slice(&32u16.to_le_bytes());
        bpb[19..21].copy_from_slice(&64u16.to_le_bytes());
        bpb[22..24].copy_from_slice(&4u16.to_le_bytes());
        let g = VolumeGeometry::from_boot_sector(&bpb).unwrap();
        assert_eq!(g.root_dir_start, 8);
        assert_eq!(g.root_dir_sectors, 8);

        let short = *b"VERYLO~1TXT";
        let name = "a very long file name that needs quite a few fragments to store.txt";
        let mut run = make_long(name, &short);
        assert!(run.len() >= 6);
        run.push(make_short(&short, 2, 1));

        let mut image = vec![0u8; 64 * 128];
        let mut pos = 8 * 128 + 96;
        for slot in &run {
            image[pos..pos + 32].copy_from_slice(slot);
            pos += 32;
        }
        image[8 * 128..8 * 128 + 32].copy_from_slice(&deleted_padding(1)[0]);
        image[8 * 128 + 32..8 * 128 + 64].copy_from_slice(&deleted_padding(1)[0]);
        image[8 * 128 + 64..8 * 128 + 96].copy_from_slice(&deleted_padding(1)[0]);
        let mut src = StreamSource::from_bytes(image);

        let entries = read_root(&mut src, &g).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, name);
    }

    #[test]
    fn test_deleted_entries_skipped() {
        let g = make_geometry();
        let mut slots = deleted_padding(3);
        slots.push(make_short(b"KEEP    TXT", 2, 1));
        let mut src = make_image(0, &slots);
        let entries = read_root(&mut src, &g).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "KEEP.TXT");
    }

    #[test]
    fn test_empty_marker_stops_scan() {
        let g = make_geometry();
        let slots = vec![
            make_short(b"FIRST   TXT", 2, 1),
            [0u8; 32],
            make_short(b"HIDDEN  TXT", 3, 1),
        ];
        let mut src = make_image(0, &slots);
        let entries = read_root(&mut src, &g).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_non_terminal_fragment_first_is_unexpected() {
        let g = make_geometry();
        let short = *b"ALONGN~1TXT";
        let mut slots = make_long("a longer name here.txt", &short);
        slots.remove(0);
        slots.push(make_short(&short, 5, 99));
        let mut src = make_image(0, &slots);

        let err = read_root(&mut src, &g).unwrap_err();
        match err {
            FatError::UnexpectedEntryOrder { sector, offset } => {
                assert_eq!(sector, ROOT_START as u64);
                assert_eq!(offset, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_broken_fragment_chain() {
        let g = make_geometry();
        let short = *b"ALONGN~1TXT";
        let mut slots = make_long("a longer name here.txt", &short);
        slots[1][11] = 0x20;
        slots.push(make_short(&short, 5, 99));
        let mut src = make_image(0, &slots);

        assert!(matches!(
            read_root(&mut src, &g),
            Err(FatError::MalformedLongNameChain { .. })
        ));
    }

    #[test]
    fn test_terminal_fragment_without_count() {
        let g = make_geometry();
        let short = *b"ZERO    TXT";
        let mut slots = make_long("zero", &short);
        slots[0][0] = LAST_LONG_ENTRY;
        slots.push(make_short(&short, 5, 99));
        let mut src = make_image(0, &slots);

        let err = read_root(&mut src, &g).unwrap_err();
        assert!(
            matches!(err, FatError::MalformedLongNameChain { sector, offset: 0, .. } if sector == ROOT_START as u64),
            "{err}"
        );
    }

    #[test]
    fn test_run_without_short_entry() {
        let g = make_geometry();
        let short = *b"SHORTN~1TXT";
        let run = make_long("short name", &short);
        assert_eq!(run.len(), 1);

        let mut deleted = make_short(&short, 5, 99);
        deleted[0] = DELETED_MARKER;
        let stray = make_long("another", b"ANOTHER    ")[0];
        for follower in [[0u8; 32], deleted, stray] {
            let mut slots = run.clone();
            slots.push(follower);
            slots.push(make_short(&short, 5, 99));
            let mut src = make_image(0, &slots);

            let err = read_root(&mut src, &g).unwrap_err();
            assert!(
                matches!(err, FatError::MalformedLongNameChain { offset: 32, .. }),
                "{err}"
            );
        }
    }

    #[test]
    fn test_name_trimmed_at_both_ends() {
        let g = make_geometry();
        let short = *b"PADDED~1TXT";
        let mut slots = make_long("  padded name.txt ", &short);
        slots.push(make_short(&short, 5, 99));
        let mut src = make_image(0, &slots);
        assert_eq!(read_root(&mut src, &g).unwrap()[0].name, "padded name.txt");
    }

    #[test]
    fn test_run_past_root_end() {
        let g = make_geometry();
        let short = *b"ALONGN~1TXT";
        let mut slots = deleted_padding(63);
        slots.extend(make_long("a longer name here.txt", &short).into_iter().take(1));
        let mut src = make_image(0, &slots);

        assert!(matches!(
            read_root(&mut src, &g),
            Err(FatError::MalformedLongNameChain { .. })
        ));
    }

    #[test]
    fn test_checksum_policy() {
        let g = make_geometry();
        let short = *b"ALONGN~1TXT";
        let mut slots = make_long("a longer name here.txt", &short);
        slots[0][13] ^= 0xFF;
        slots.push(make_short(&short, 5, 99));

        let mut src = make_image(0, &slots);
        let entries = read_root(&mut src, &g).unwrap();
        assert_eq!(entries[0].name, "a longer name here.txt");

        let strict = DirectoryDecoder::new(&g).with_checksum_policy(ChecksumPolicy::Strict);
        assert!(matches!(
            strict.read_root(&mut src),
            Err(FatError::LongNameChecksum { .. })
        ));
    }

    #[test]
    fn test_strict_accepts_valid_checksum() {
        let g = make_geometry();
        let short = *b"ALONGN~1TXT";
        let mut slots = make_long("a longer name here.txt", &short);
        slots.push(make_short(&short, 5, 99));
        let mut src = make_image(0, &slots);

        let strict = DirectoryDecoder::new(&g).with_checksum_policy(ChecksumPolicy::Strict);
        assert_eq!(strict.read_root(&mut src).unwrap().len(), 1);
    }

    #[test]
    fn test_name_exactly_one_fragment() {
        let g = make_geometry();
        let short = *b"THIRTE~1   ";
        let mut slots = make_long("thirteen-char", &short);
        assert_eq!(slots.len(), 1);
        slots.push(make_short(&short, 2, 0));
        let mut src = make_image(0, &slots);
        assert_eq!(read_root(&mut src, &g).unwrap()[0].name, "thirteen-char");
    }

    #[test]
    fn test_rehome() {
        assert_eq!(rehome(512, 512), 0);
        assert_eq!(rehome(544, 512), 32);
        assert_eq!(rehome(160, 128), 32);
    }
}
