use thiserror::Error;

use crate::humanize::ByteSize;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger file not found: {0}")]
    NotFound(String),

    #[error("Ledger file '{name}' is {size} bytes, limit is {limit}")]
    FileTooLarge {
        name: String,
        size: u64,
        limit: ByteSize,
    },

    #[error("Ledger file '{0}' is not valid UTF-8")]
    InvalidEncoding(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
