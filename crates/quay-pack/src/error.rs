use quay_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("invalid pack magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported pack version: {0}")]
    UnsupportedVersion(u32),

    #[error("pack checksum mismatch")]
    ChecksumMismatch,

    #[error("corrupt pack entry at offset {offset}: {reason}")]
    CorruptEntry { offset: u64, reason: String },

    #[error("CRC32 mismatch for object {id}")]
    CrcMismatch { id: ObjectId },

    #[error("duplicate object {id} at offset {offset}")]
    DuplicateObject { id: ObjectId, offset: u64 },

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("incomplete pack stream: {0}")]
    Incomplete(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index corrupted: {0}")]
    IndexCorrupted(String),
}

pub type PackResult<T> = Result<T, PackError>;

impl From<PackError> for quay_store::StoreError {
    fn from(err: PackError) -> Self {
        match err {
            PackError::Io(e) => Self::Io(e),
            other => Self::Backend(other.to_string()),
        }
    }
}
