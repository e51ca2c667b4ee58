use thiserror::Error;

#[derive(Error, Debug)]
pub enum FatError {
    #[error("I/O error reading {len} bytes at offset {offset}: {source}")]
    IoFailure {
        offset: u64,
        len: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed boot sector: {0}")]
    MalformedBootSector(String),

    #[error("Unexpected directory entry order at sector {sector}, offset {offset}: expected final long-name entry")]
    UnexpectedEntryOrder { sector: u64, offset: usize },

    #[error("Malformed long-name chain at sector {sector}, offset {offset}: {reason}")]
    MalformedLongNameChain {
        sector: u64,
        offset: usize,
        reason: String,
    },

    #[error("Long-name checksum mismatch at sector {sector}, offset {offset}: expected {expected:#04x}, found {found:#04x}")]
    LongNameChecksum {
        sector: u64,
        offset: usize,
        expected: u8,
        found: u8,
    },

    #[error("Corrupt allocation chain at cluster {cluster}: {reason}")]
    CorruptAllocationChain { cluster: u16, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not a file: {0}")]
    NotAFile(String),
}

impl FatError {
    pub(crate) fn io(offset: u64, len: usize, source: std::io::Error) -> Self {
        FatError::IoFailure {
            offset,
            len,
            source,
        }
    }

    pub(crate) fn chain(cluster: u16, reason: impl Into<String>) -> Self {
        FatError::CorruptAllocationChain {
            cluster,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = FatError> = std::result::Result<T, E>;
