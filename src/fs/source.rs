//! Byte-range access to a backing volume image.
//!
//! Every read is an independent seek-then-read. Nothing here assumes the
//! previous read left the stream positioned anywhere useful, so directory
//! decoding and cluster-chain walks can interleave freely.

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{FatError, Result};

/// Random-access reader over a volume image.
pub trait RawSectorSource {
    /// Fill `buf` with the bytes starting at absolute byte `offset`.
    ///
    /// A short read (truncated image) is an error, never a partial fill.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Read `len` bytes starting at `offset` into a new buffer.
    fn read(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_at(offset, &mut buf)?;
        Ok(buf)
    }
}

impl<S: RawSectorSource + ?Sized> RawSectorSource for &mut S {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        (**self).read_at(offset, buf)
    }
}

/// A source backed by any seekable stream (an open `File`, a `Cursor`, ...).
pub struct StreamSource<R> {
    inner: R,
}

impl<R: Read + Seek> StreamSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl StreamSource<Cursor<Vec<u8>>> {
    /// Wrap an image already held in memory.
    pub fn from_bytes(image: Vec<u8>) -> Self {
        Self::new(Cursor::new(image))
    }
}

impl<R: Read + Seek> RawSectorSource for StreamSource<R> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| FatError::io(offset, buf.len(), e))?;
        self.inner
            .read_exact(buf)
            .map_err(|e| FatError::io(offset, buf.len(), e))
    }
}

/// A source that reopens the image file for every read.
///
/// No handle is held between reads, so a refreshed allocation table sees
/// whatever is on disk at the time of the refresh.
#[derive(Debug, Clone)]
pub struct ImageFile {
    path: PathBuf,
}

impl ImageFile {
    /// Check that `path` exists and remember it. The file is not kept open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::metadata(&path).map_err(|e| FatError::io(0, 0, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RawSectorSource for ImageFile {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let file = File::open(&self.path).map_err(|e| FatError::io(offset, buf.len(), e))?;
        StreamSource::new(file).read_at(offset, buf)
    }
}
