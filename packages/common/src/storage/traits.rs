use std::fmt;
use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::artifact_id::ArtifactId;
use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub id: ArtifactId,
    /// Number of bytes published.
    pub size: u64,
    /// Lowercase hex SHA-256 of the published bytes.
    pub sha256: String,
}

/// An open blob, positioned at offset 0.
///
/// The reader owns the underlying handle; dropping it releases the handle.
pub struct StoredBlob {
    pub reader: BoxReader,
    pub size: u64,
}

impl fmt::Debug for StoredBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredBlob")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Blob storage keyed by artifact id.
///
/// Writes replace any blob already stored under the same id and must be
/// atomic for concurrent readers: a reader sees either the old or the new
/// bytes, never a partial write.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `id`, replacing any previous blob.
    async fn put(&self, id: &ArtifactId, data: &[u8]) -> Result<BlobInfo, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(id, reader, Some(data.len() as u64)).await
    }

    /// Store data from an async reader under `id`, replacing any previous blob.
    ///
    /// When `expected_size` is given, a stream of any other length is rejected
    /// and nothing is published.
    async fn put_stream(
        &self,
        id: &ArtifactId,
        reader: BoxReader,
        expected_size: Option<u64>,
    ) -> Result<BlobInfo, StorageError>;

    /// Retrieve all bytes of a blob.
    async fn get(&self, id: &ArtifactId) -> Result<Vec<u8>, StorageError> {
        let mut blob = self.get_stream(id).await?;
        let mut buf = Vec::new();
        blob.reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Open a blob as a streaming async reader.
    async fn get_stream(&self, id: &ArtifactId) -> Result<StoredBlob, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, id: &ArtifactId) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, id: &ArtifactId) -> Result<bool, StorageError>;

    /// Get the size of a blob in bytes.
    async fn size(&self, id: &ArtifactId) -> Result<u64, StorageError>;
}
