use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

pub const DIR_ENTRY_SIZE: usize = 32;
/// First byte of a slot that has never been used. Every later slot is empty too.
pub const EMPTY_MARKER: u8 = 0x00;
/// First byte of a deleted slot.
pub const DELETED_MARKER: u8 = 0xE5;
/// Stand-in first byte for names that really begin with 0xE5.
const KANJI_E5_MARKER: u8 = 0x05;
pub const ATTR_OFFSET: usize = 11;
pub const ATTR_LONG_NAME: u8 = 0x0F;

/// File attribute bits of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attributes(pub u8);

impl Attributes {
    pub const READ_ONLY: u8 = 0x01;
    pub const HIDDEN: u8 = 0x02;
    pub const SYSTEM: u8 = 0x04;
    pub const VOLUME: u8 = 0x08;
    pub const DIRECTORY: u8 = 0x10;
    pub const ARCHIVE: u8 = 0x20;

    pub fn contains(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    pub fn is_read_only(self) -> bool {
        self.contains(Self::READ_ONLY)
    }

    pub fn is_hidden(self) -> bool {
        self.contains(Self::HIDDEN)
    }

    pub fn is_system(self) -> bool {
        self.contains(Self::SYSTEM)
    }

    pub fn is_volume(self) -> bool {
        self.contains(Self::VOLUME)
    }

    pub fn is_directory(self) -> bool {
        self.contains(Self::DIRECTORY)
    }

    pub fn is_archive(self) -> bool {
        self.contains(Self::ARCHIVE)
    }

    /// Names of the set bits, lowest bit first.
    pub fn names(self) -> Vec<&'static str> {
        [
            (Self::READ_ONLY, "read-only"),
            (Self::HIDDEN, "hidden"),
            (Self::SYSTEM, "system"),
            (Self::VOLUME, "volume"),
            (Self::DIRECTORY, "directory"),
            (Self::ARCHIVE, "archive"),
        ]
        .into_iter()
        .filter(|&(bit, _)| self.contains(bit))
        .map(|(_, name)| name)
        .collect()
    }
}

/// A packed FAT date: bits 0-4 day, 5-8 month, 9-15 years since 1980.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl FatDate {
    pub fn from_raw(raw: u16) -> Self {
        Self {
            day: (raw & 0x1F) as u8,
            month: ((raw >> 5) & 0x0F) as u8,
            year: ((raw >> 9) & 0x7F) + 1980,
        }
    }

    /// `None` when the fields don't name a real day (including the all-zero
    /// "no date" value).
    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
    }
}

/// A packed FAT time: bits 0-4 two-second ticks, 5-10 minute, 11-15 hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl FatTime {
    pub fn from_raw(raw: u16) -> Self {
        Self {
            second: ((raw & 0x1F) * 2) as u8,
            minute: ((raw >> 5) & 0x3F) as u8,
            hour: ((raw >> 11) & 0x1F) as u8,
        }
    }

    pub fn to_naive(self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
    }
}

/// One resolved root-directory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// Long name when one was stored, otherwise the 8.3 name.
    pub name: String,
    /// The 8.3 name, `NAME.EXT` or `NAME` when there is no extension.
    pub short_name: String,
    pub extension: String,
    pub attributes: Attributes,
    pub creation_time: u16,
    pub creation_date: u16,
    pub last_access_date: u16,
    pub last_write_time: u16,
    pub last_write_date: u16,
    pub first_cluster: u16,
    pub file_size: u32,
    /// Name and extension bytes exactly as stored.
    #[serde(skip)]
    pub raw_name: [u8; 11],
}

impl DirectoryEntry {
    /// Build an entry from a 32-byte short-entry slot.
    ///
    /// Returns `None` for slots that never describe a file: empty, deleted,
    /// or long-name fragments.
    pub fn parse(slot: &[u8], long_name: Option<String>) -> Option<Self> {
        if slot.len() < DIR_ENTRY_SIZE || !is_short_entry(slot) {
            return None;
        }

        let mut raw_name = [0u8; 11];
        raw_name.copy_from_slice(&slot[0..11]);
        let short_name = build_short_name(&slot[0..8], &slot[8..11]);
        let extension = decode_oem_string(&slot[8..11]).trim_end().to_string();

        let mut cursor = Cursor::new(&slot[14..DIR_ENTRY_SIZE]);
        let mut next = || cursor.read_u16::<LittleEndian>().unwrap_or(0);
        let creation_time = next();
        let creation_date = next();
        let last_access_date = next();
        let _cluster_high = next();
        let last_write_time = next();
        let last_write_date = next();
        let first_cluster = next();
        let file_size = u32::from_le_bytes([slot[28], slot[29], slot[30], slot[31]]);

        let name = match long_name {
            Some(name) if !name.is_empty() => name,
            _ => short_name.clone(),
        };

        Some(Self {
            name,
            short_name,
            extension,
            attributes: Attributes(slot[ATTR_OFFSET]),
            creation_time,
            creation_date,
            last_access_date,
            last_write_time,
            last_write_date,
            first_cluster,
            file_size,
            raw_name,
        })
    }

    pub fn is_directory(&self) -> bool {
        self.attributes.is_directory()
    }

    pub fn is_volume_label(&self) -> bool {
        self.attributes.is_volume()
    }

    pub fn is_file(&self) -> bool {
        !self.is_directory() && !self.is_volume_label()
    }

    pub fn created(&self) -> Option<NaiveDateTime> {
        let date = FatDate::from_raw(self.creation_date).to_naive()?;
        Some(date.and_time(FatTime::from_raw(self.creation_time).to_naive()?))
    }

    pub fn last_written(&self) -> Option<NaiveDateTime> {
        let date = FatDate::from_raw(self.last_write_date).to_naive()?;
        Some(date.and_time(FatTime::from_raw(self.last_write_time).to_naive()?))
    }

    pub fn last_accessed(&self) -> Option<NaiveDate> {
        FatDate::from_raw(self.last_access_date).to_naive()
    }

    /// Checksum every long-name fragment of this entry should carry.
    pub fn checksum(&self) -> u8 {
        short_name_checksum(&self.raw_name)
    }
}

/// True for a slot that holds a live short entry.
pub fn is_short_entry(slot: &[u8]) -> bool {
    slot[0] != EMPTY_MARKER && slot[0] != DELETED_MARKER && slot[ATTR_OFFSET] != ATTR_LONG_NAME
}

/// VFAT checksum of an 11-byte short name.
pub fn short_name_checksum(raw_name: &[u8; 11]) -> u8 {
    raw_name
        .iter()
        .fold(0u8, |sum, &b| sum.rotate_right(1).wrapping_add(b))
}

/// Build a DOS 8.3 short filename from the name and extension bytes.
///
/// FAT short names use OEM codepage encoding (typically CP437). Bytes 0x80-0xFF
/// are decoded using the CP437 table rather than assuming UTF-8.
pub fn build_short_name(name: &[u8], ext: &[u8]) -> String {
    let mut name_str = decode_oem_string(name);
    if name.first() == Some(&KANJI_E5_MARKER) {
        name_str.replace_range(..1, &cp437_to_char(DELETED_MARKER).to_string());
    }
    let name_trimmed = name_str.trim_end();
    let ext_str = decode_oem_string(ext);
    let ext_trimmed = ext_str.trim_end();

    if ext_trimmed.is_empty() {
        name_trimmed.to_string()
    } else {
        format!("{name_trimmed}.{ext_trimmed}")
    }
}

fn decode_oem_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| cp437_to_char(b)).collect()
}

fn cp437_to_char(b: u8) -> char {
    if b < 0x80 {
        b as char
    } else {
        CP437_HIGH[b as usize - 0x80]
    }
}

/// CP437 to Unicode mapping for bytes 0x80-0xFF.
#[rustfmt::skip]
const CP437_HIGH: [char; 128] = [
    // 0x80-0x8F
    'Ç','ü','é','â','ä','à','å','ç', 'ê','ë','è','ï','î','ì','Ä','Å',
    // 0x90-0x9F
    'É','æ','Æ','ô','ö','ò','û','ù', 'ÿ','Ö','Ü','¢','£','¥','₧','ƒ',
    // 0xA0-0xAF
    'á','í','ó','ú','ñ','Ñ','ª','º', '¿','⌐','¬','½','¼','¡','«','»',
    // 0xB0-0xBF
    '░','▒','▓','│','┤','╡','╢','╖', '╕','╣','║','╗','╝','╜','╛','┐',
    // 0xC0-0xCF
    '└','┴','┬','├','─','┼','╞','╟', '╚','╔','╩','╦','╠','═','╬','╧',
    // 0xD0-0xDF
    '╨','╤','╥','╙','╘','╒','╓','╫', '╪','┘','┌','█','▄','▌','▐','▀',
    // 0xE0-0xEF
    'α','ß','Γ','π','Σ','σ','µ','τ', 'Φ','Θ','Ω','δ','∞','φ','ε','∩',
    // 0xF0-0xFF
    '≡','±','≥','≤','⌠','⌡','÷','≈', '°','∙','·','√','ⁿ','²','■','\u{00A0}',
];
