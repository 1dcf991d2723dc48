//! Object storage for ledger inputs and report artifacts
//! Uses Apache Arrow object_store crate

use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::{ObjectStore, path::Path as StoragePath};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Metadata returned after upload
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    pub key: String,
    pub etag: Option<String>,
    pub size: usize,
}

/// Top-level object found by [`StorageClient::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub name: String,
    pub size: u64,
}

/// Storage client wrapping object_store
///
/// `location` names the backing root (canonical directory or memory label)
/// and is what distinguishes two clients holding files of the same name.
#[derive(Clone)]
pub struct StorageClient {
    store: Arc<dyn ObjectStore>,
    location: String,
}

impl StorageClient {
    /// Create new storage client with any object_store backend
    pub fn new(store: Arc<dyn ObjectStore>, location: impl Into<String>) -> Self {
        Self {
            store,
            location: location.into(),
        }
    }

    /// Open a directory on the local filesystem, creating it if missing
    pub fn local(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let root = std::fs::canonicalize(dir)?;
        let store = LocalFileSystem::new_with_prefix(&root)?;

        tracing::info!(root = %root.display(), "Opened local storage");

        Ok(Self::new(Arc::new(store), root.display().to_string()))
    }

    /// Open an existing directory on the local filesystem.
    ///
    /// A missing directory is [`StorageError::NotFound`]; nothing is created.
    pub fn local_existing(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let root = std::fs::canonicalize(dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(dir.display().to_string()),
            _ => StorageError::Io(e),
        })?;
        if !root.is_dir() {
            return Err(StorageError::NotFound(dir.display().to_string()));
        }
        let store = LocalFileSystem::new_with_prefix(&root)?;

        tracing::info!(root = %root.display(), "Opened local storage");

        Ok(Self::new(Arc::new(store), root.display().to_string()))
    }

    /// Create in-memory storage for testing/development
    pub fn in_memory(label: &str) -> Self {
        Self::new(Arc::new(InMemory::new()), format!("memory://{label}"))
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Upload bytes to storage, replacing any existing object
    pub async fn upload(&self, key: &str, data: Bytes) -> Result<UploadMetadata> {
        let path = StoragePath::from(key);
        let size = data.len();

        let put_result = self.store.put(&path, data.into()).await?;

        tracing::debug!(key, size, "Uploaded to storage");

        Ok(UploadMetadata {
            key: key.to_string(),
            etag: put_result.e_tag,
            size,
        })
    }

    /// Download from storage
    pub async fn download(&self, key: &str) -> Result<Bytes> {
        let path = StoragePath::from(key);

        let result = self.store.get(&path).await.map_err(|e| not_found(key, e))?;
        let bytes = result.bytes().await.map_err(|e| not_found(key, e))?;

        tracing::debug!(key, size = bytes.len(), "Downloaded from storage");

        Ok(bytes)
    }

    /// Size in bytes of a stored object
    pub async fn size(&self, key: &str) -> Result<u64> {
        let path = StoragePath::from(key);
        let meta = self.store.head(&path).await.map_err(|e| not_found(key, e))?;
        Ok(meta.size)
    }

    /// Check if key exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        match self.size(key).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// List objects directly under the root; nested prefixes are skipped
    pub async fn list(&self) -> Result<Vec<ObjectEntry>> {
        let listing = self.store.list_with_delimiter(None).await?;

        Ok(listing
            .objects
            .into_iter()
            .filter_map(|meta| {
                let name = meta.location.filename()?.to_string();
                Some(ObjectEntry {
                    name,
                    size: meta.size,
                })
            })
            .collect())
    }
}

fn not_found(key: &str, err: object_store::Error) -> StorageError {
    match err {
        object_store::Error::NotFound { .. } => StorageError::NotFound(key.to_string()),
        other => StorageError::ObjectStoreError(other),
    }
}
