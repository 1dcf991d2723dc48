use async_trait::async_trait;
use tracing::debug;

use super::error::{LedgerError, Result};
use crate::humanize::ByteSize;
use crate::storage::{StorageClient, StorageError};

/// Read access to a location holding ledger files
///
/// The export pipeline only ever lists and reads; it never writes here.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Identifies the location; two sources with different locations never
    /// share parse cache entries.
    fn location(&self) -> &str;

    /// File names directly inside the location, sorted
    async fn list_files(&self) -> Result<Vec<String>>;

    /// Full text of one file
    async fn read_file(&self, name: &str) -> Result<String>;
}

/// Ledger files kept in a [`StorageClient`]
#[derive(Clone)]
pub struct StoredLedger {
    storage: StorageClient,
    max_file_bytes: ByteSize,
}

impl StoredLedger {
    pub fn new(storage: StorageClient, max_file_bytes: ByteSize) -> Self {
        Self {
            storage,
            max_file_bytes,
        }
    }
}

#[async_trait]
impl LedgerSource for StoredLedger {
    fn location(&self) -> &str {
        self.storage.location()
    }

    async fn list_files(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .storage
            .list()
            .await?
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        names.sort();

        debug!(location = self.location(), count = names.len(), "Listed ledger files");
        Ok(names)
    }

    async fn read_file(&self, name: &str) -> Result<String> {
        let size = self.storage.size(name).await.map_err(|e| from_storage(name, e))?;
        if size > self.max_file_bytes.as_u64() {
            return Err(LedgerError::FileTooLarge {
                name: name.to_string(),
                size,
                limit: self.max_file_bytes,
            });
        }

        let bytes = self
            .storage
            .download(name)
            .await
            .map_err(|e| from_storage(name, e))?;

        String::from_utf8(bytes.to_vec()).map_err(|_| LedgerError::InvalidEncoding(name.to_string()))
    }
}

fn from_storage(name: &str, err: StorageError) -> LedgerError {
    match err {
        StorageError::NotFound(_) => LedgerError::NotFound(name.to_string()),
        other => LedgerError::Storage(other),
    }
}
