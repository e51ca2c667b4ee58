//! Read-only decoder for FAT12 volume images.
//!
//! Parses the boot sector, the 12-bit packed allocation table and the root
//! directory (including VFAT long filenames), and extracts file contents by
//! following cluster chains.

pub mod error;
pub mod fs;

pub use error::FatError;
pub use fs::{open_image, Fat12Volume};
