//! Publication lifecycle on top of the registration coordinator.
//!
//! Every path that produces an encrypted artifact registers it before any
//! publication row is written, and removes the scratch files it created
//! whether or not the later steps succeed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::{Stream, StreamExt};
use quire_common::ArtifactId;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

use crate::catalog::{
    CatalogError, NewPublication, PublicationCatalog, PublicationRecord, PublicationStatus,
};
use crate::encryption::{EncryptionError, Encrypter};
use crate::registry::{RegistrationCoordinator, RegistryError};
use crate::utils::filename::validate_flat_filename;
use crate::utils::slug::slugify;

/// Longest accepted title, in characters, after trimming.
pub const MAX_TITLE_CHARS: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Encryption(#[from] EncryptionError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Catalog(CatalogError),
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CatalogError> for PipelineError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            other => Self::Catalog(other),
        }
    }
}

/// Trim and check a publication title.
pub fn normalize_title(title: &str) -> Result<&str, PipelineError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
        return Err(PipelineError::Validation(format!(
            "Title must be 1-{MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title)
}

fn disposition_for(title: &str) -> Result<String, PipelineError> {
    slugify(title).ok_or_else(|| {
        PipelineError::Validation("Title must contain at least one letter or digit".into())
    })
}

/// A request body spooled to local disk.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    size: u64,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub async fn discard(self) {
        // Best effort.
        let _ = tokio::fs::remove_file(&self.path).await;
    }
}

/// Artifact produced by an EPUB upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedArtifact {
    pub id: ArtifactId,
    pub disposition: String,
}

pub struct PublicationService {
    coordinator: Arc<RegistrationCoordinator>,
    publications: Arc<dyn PublicationCatalog>,
    encrypter: Arc<dyn Encrypter>,
    master_repository: PathBuf,
    scratch_dir: PathBuf,
    max_upload_size: u64,
}

impl PublicationService {
    pub fn new(
        coordinator: Arc<RegistrationCoordinator>,
        publications: Arc<dyn PublicationCatalog>,
        encrypter: Arc<dyn Encrypter>,
        master_repository: PathBuf,
        scratch_dir: PathBuf,
        max_upload_size: u64,
    ) -> Self {
        Self {
            coordinator,
            publications,
            encrypter,
            master_repository,
            scratch_dir,
            max_upload_size,
        }
    }

    pub fn coordinator(&self) -> &RegistrationCoordinator {
        &self.coordinator
    }

    /// Encrypt a master file, register the result and record the publication.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        master_filename: &str,
        title: &str,
    ) -> Result<PublicationRecord, PipelineError> {
        let title = normalize_title(title)?;
        let master_filename = validate_flat_filename(master_filename)
            .map_err(|e| PipelineError::Validation(e.to_string()))?;
        let disposition = disposition_for(title)?;

        let source = self.master_repository.join(master_filename);
        if !tokio::fs::try_exists(&source).await? {
            return Err(PipelineError::NotFound(format!(
                "Master file '{master_filename}' not found"
            )));
        }

        let id = self.encrypt_and_register(&source, &disposition).await?;

        let record = self
            .publications
            .insert(NewPublication {
                uuid: Uuid::new_v4(),
                title: title.to_string(),
                status: PublicationStatus::Draft,
                master_filename: master_filename.to_string(),
            })
            .await?;

        tracing::info!(
            publication_id = record.id,
            artifact_id = %id,
            %disposition,
            "Publication created"
        );
        Ok(record)
    }

    pub async fn get(&self, id: i64) -> Result<PublicationRecord, PipelineError> {
        Ok(self.publications.get(id).await?)
    }

    pub async fn get_by_title(&self, title: &str) -> Result<PublicationRecord, PipelineError> {
        Ok(self.publications.get_by_title(title).await?)
    }

    /// One page of publications; `page_index` is 0-based.
    pub async fn list(
        &self,
        page_index: u64,
        per_page: u64,
    ) -> Result<Vec<PublicationRecord>, PipelineError> {
        Ok(self.publications.list(page_index, per_page).await?)
    }

    /// Replace the title of a publication. Status and artifact are untouched.
    #[instrument(skip(self))]
    pub async fn update(&self, id: i64, title: &str) -> Result<PublicationRecord, PipelineError> {
        self.publications.get(id).await?;
        let title = normalize_title(title)?;
        Ok(self.publications.update_title(id, title).await?)
    }

    /// Remove a publication and its master file. The registered artifact stays.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), PipelineError> {
        let record = self.publications.get(id).await?;

        match validate_flat_filename(&record.master_filename) {
            Ok(name) => {
                let path = self.master_repository.join(name);
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        tracing::debug!(path = %path.display(), "Master file already absent");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => {
                tracing::warn!(
                    master_filename = %record.master_filename,
                    "Skipping master file removal: {e}"
                );
            }
        }

        self.publications.delete(id).await?;
        tracing::info!(publication_id = id, "Publication deleted");
        Ok(())
    }

    /// Spool a chunked body to the scratch directory, enforcing the size limit.
    pub async fn stage<S, B, E>(&self, chunks: S) -> Result<StagedUpload, PipelineError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: std::fmt::Display,
    {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        let path = self
            .scratch_dir
            .join(format!("quire-upload-{}", Uuid::new_v4()));

        let result = async {
            let mut chunks = std::pin::pin!(chunks);
            let mut file = tokio::fs::File::create(&path).await?;
            let mut size: u64 = 0;

            while let Some(chunk) = chunks.next().await {
                let chunk = chunk
                    .map_err(|e| PipelineError::Validation(format!("Upload read error: {e}")))?;
                let chunk = chunk.as_ref();
                size += chunk.len() as u64;
                if size > self.max_upload_size {
                    return Err(PipelineError::Validation(format!(
                        "Upload exceeds maximum size of {} bytes",
                        self.max_upload_size
                    )));
                }
                file.write_all(chunk).await?;
            }

            file.flush().await?;
            Ok(size)
        }
        .await;

        match result {
            Ok(size) => Ok(StagedUpload { path, size }),
            Err(e) => {
                // Best effort.
                let _ = tokio::fs::remove_file(&path).await;
                Err(e)
            }
        }
    }

    /// Encrypt a staged payload under `name` and register it with a fresh id.
    #[instrument(skip(self, staged), fields(size = staged.size()))]
    pub async fn ingest_content(
        &self,
        name: &str,
        staged: StagedUpload,
    ) -> Result<ArtifactId, PipelineError> {
        let result = async {
            let name = validate_flat_filename(name)
                .map_err(|e| PipelineError::Validation(e.to_string()))?;
            if staged.size() == 0 {
                return Err(PipelineError::Validation(
                    "Content body must not be empty".into(),
                ));
            }
            self.encrypt_and_register(staged.path(), name).await
        }
        .await;

        staged.discard().await;
        result
    }

    /// Encrypt an uploaded EPUB named after `title` and register it.
    #[instrument(skip(self, staged), fields(size = staged.size()))]
    pub async fn upload(
        &self,
        title: &str,
        staged: StagedUpload,
    ) -> Result<UploadedArtifact, PipelineError> {
        let result = async {
            let disposition = disposition_for(normalize_title(title)?)?;
            if staged.size() == 0 {
                return Err(PipelineError::Validation(
                    "Uploaded file must not be empty".into(),
                ));
            }
            let id = self.encrypt_and_register(staged.path(), &disposition).await?;
            Ok(UploadedArtifact { id, disposition })
        }
        .await;

        staged.discard().await;
        result
    }

    async fn encrypt_and_register(
        &self,
        source: &Path,
        disposition: &str,
    ) -> Result<ArtifactId, PipelineError> {
        let artifact = self.encrypter.encrypt(source, disposition).await?;

        let id = ArtifactId::generate();
        let registered = self.coordinator.register_artifact(&id, &artifact).await;

        // Best effort.
        let _ = tokio::fs::remove_file(&artifact.path).await;

        registered?;
        Ok(id)
    }
}
