use som_schema::TypeId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("invalid blob magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported blob version: {0}")]
    UnsupportedVersion(u32),

    #[error("blob type not in repository: {0}")]
    UnknownType(TypeId),

    #[error("corrupt blob at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("blob truncated at offset {offset}")]
    Truncated { offset: u64 },

    #[error("blob checksum mismatch")]
    ChecksumMismatch,

    #[error("compression failed: {0}")]
    Compression(String),
}

pub type WireResult<T> = Result<T, WireError>;
