//! Two-store registration of encrypted artifacts.
//!
//! Bytes always reach the blob store before metadata reaches the content
//! catalog, so a failure can leave an orphan blob but never a catalog row
//! without retrievable bytes.

use std::path::PathBuf;
use std::sync::Arc;

use quire_common::{ArtifactId, BlobStore, BoxReader, StorageError, StoredBlob};
use tracing::instrument;

use crate::catalog::{CatalogError, ContentCatalog, ContentRecord};
use crate::encryption::EncryptedArtifact;

/// Whether a registration inserted a new record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Created,
    Updated,
}

/// A catalogued artifact together with an open stream over its bytes.
#[derive(Debug)]
pub struct FetchedArtifact {
    pub record: ContentRecord,
    pub blob: StoredBlob,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("content not found: {0}")]
    NotFound(ArtifactId),
    #[error("content {0} is catalogued but its bytes are missing from the blob store")]
    Integrity(ArtifactId),
    #[error("cannot read encrypted artifact at {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub struct RegistrationCoordinator {
    blobs: Arc<dyn BlobStore>,
    catalog: Arc<dyn ContentCatalog>,
}

impl RegistrationCoordinator {
    pub fn new(blobs: Arc<dyn BlobStore>, catalog: Arc<dyn ContentCatalog>) -> Self {
        Self { blobs, catalog }
    }

    /// Store the artifact's bytes under `id`, then insert or replace its
    /// catalog record.
    #[instrument(skip(self, artifact), fields(id = %id))]
    pub async fn register_artifact(
        &self,
        id: &ArtifactId,
        artifact: &EncryptedArtifact,
    ) -> Result<RegistrationOutcome, RegistryError> {
        let exists = match self.catalog.get(id).await {
            Ok(_) => true,
            Err(CatalogError::NotFound(_)) => false,
            Err(e) => return Err(e.into()),
        };

        let file = tokio::fs::File::open(&artifact.path)
            .await
            .map_err(|source| RegistryError::Source {
                path: artifact.path.clone(),
                source,
            })?;
        let reader: BoxReader = Box::new(file);
        let info = self.blobs.put_stream(id, reader, None).await?;

        let record = ContentRecord::from_artifact(id.clone(), artifact);
        if let Some(declared) = record.known_length()
            && declared != info.size
        {
            tracing::warn!(
                declared,
                measured = info.size,
                "Declared length differs from stored bytes"
            );
        }
        if !record.sha256.is_empty() && !record.sha256.eq_ignore_ascii_case(&info.sha256) {
            tracing::warn!(
                declared = %record.sha256,
                measured = %info.sha256,
                "Declared checksum differs from stored bytes"
            );
        }

        let outcome = if exists {
            self.catalog.update(&record).await?;
            RegistrationOutcome::Updated
        } else {
            match self.catalog.add(&record).await {
                Ok(()) => RegistrationOutcome::Created,
                Err(CatalogError::AlreadyExists(_)) => {
                    // A concurrent first registration inserted the row first.
                    self.catalog.update(&record).await?;
                    RegistrationOutcome::Updated
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(?outcome, size = info.size, "Artifact registered");
        Ok(outcome)
    }

    /// Look up an artifact's record and open its bytes.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn fetch_artifact(&self, id: &ArtifactId) -> Result<FetchedArtifact, RegistryError> {
        let record = match self.catalog.get(id).await {
            Ok(record) => record,
            Err(CatalogError::NotFound(_)) => return Err(RegistryError::NotFound(id.clone())),
            Err(e) => return Err(e.into()),
        };

        let blob = match self.blobs.get_stream(id).await {
            Ok(blob) => blob,
            Err(StorageError::NotFound(_)) => {
                tracing::error!("Catalog row has no blob");
                return Err(RegistryError::Integrity(id.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(FetchedArtifact { record, blob })
    }

    pub async fn list_contents(&self) -> Result<Vec<ContentRecord>, RegistryError> {
        Ok(self.catalog.list().await?)
    }
}
