use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::artifact_id::ArtifactId;
use super::error::StorageError;
use super::traits::{BlobInfo, BlobStore, BoxReader, StoredBlob};

/// Filesystem-backed blob store.
///
/// Blobs are stored in a sharded directory layout:
/// `{base_path}/{first 2 hex chars of sha256(id)}/{id}`.
/// Writes land in `{base_path}/.tmp` first and are published with a rename,
/// which replaces any previous blob atomically.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Compute the filesystem path for a given artifact id.
    fn blob_path(&self, id: &ArtifactId) -> PathBuf {
        self.base_path.join(id.shard_prefix()).join(id.as_str())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Copy `reader` into `temp_path`, enforcing the size limit.
    ///
    /// Returns the byte count and hex digest of what was written.
    async fn write_temp(
        &self,
        temp_path: &Path,
        mut reader: BoxReader,
    ) -> Result<(u64, String), StorageError> {
        let mut hasher = Sha256::new();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer
        let mut temp_file = fs::File::create(temp_path).await?;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            hasher.update(&buf[..n]);
            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        temp_file.sync_all().await?;

        Ok((total_bytes, hex::encode(hasher.finalize())))
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_stream(
        &self,
        id: &ArtifactId,
        reader: BoxReader,
        expected_size: Option<u64>,
    ) -> Result<BlobInfo, StorageError> {
        if let Some(expected) = expected_size
            && expected > self.max_size
        {
            return Err(StorageError::SizeLimitExceeded {
                actual: expected,
                limit: self.max_size,
            });
        }

        let temp_path = self.temp_path();
        let blob_path = self.blob_path(id);

        let result = async {
            let (size, sha256) = self.write_temp(&temp_path, reader).await?;

            if let Some(expected) = expected_size
                && expected != size
            {
                return Err(StorageError::SizeMismatch {
                    expected,
                    actual: size,
                });
            }

            if let Some(parent) = blob_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::rename(&temp_path, &blob_path).await?;
            tracing::debug!(id = %id, size, "Blob published");

            Ok(BlobInfo {
                id: id.clone(),
                size,
                sha256,
            })
        }
        .await;

        if result.is_err() {
            // Best effort.
            let _ = fs::remove_file(&temp_path).await;
        }

        result
    }

    async fn get_stream(&self, id: &ArtifactId) -> Result<StoredBlob, StorageError> {
        let blob_path = self.blob_path(id);
        match fs::File::open(&blob_path).await {
            Ok(file) => {
                let size = file.metadata().await?.len();
                Ok(StoredBlob {
                    reader: Box::new(BufReader::new(file)),
                    size,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, id: &ArtifactId) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(id);
        Ok(fs::try_exists(&blob_path).await?)
    }

    async fn delete(&self, id: &ArtifactId) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(id);
        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, id: &ArtifactId) -> Result<u64, StorageError> {
        let blob_path = self.blob_path(id);
        match fs::metadata(&blob_path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
