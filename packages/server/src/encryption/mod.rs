//! Encryption collaborator.
//!
//! The encryption algorithm lives outside this service. An [`Encrypter`]
//! turns a plaintext source file into an encrypted file plus the metadata
//! needed to register it.

mod command;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use command::CommandEncrypter;

/// Result of encrypting one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedArtifact {
    /// Location of the encrypted bytes on local disk.
    pub path: PathBuf,
    pub content_key: Vec<u8>,
    /// Hex SHA-256 of the encrypted bytes, when the encrypter reports one.
    pub sha256: Option<String>,
    /// Byte length of the encrypted bytes, when the encrypter reports one.
    pub length: Option<i64>,
    /// File-facing name for the artifact.
    pub disposition: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("failed to launch encrypter: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("encrypter exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("malformed encrypter output: {0}")]
    MalformedOutput(String),
    #[error("encrypted output missing at {}", .0.display())]
    MissingOutput(PathBuf),
    #[error("encrypter I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Encrypter: Send + Sync {
    /// Encrypt `source`, naming the result `disposition`.
    ///
    /// The caller owns the returned file and is responsible for removing it.
    async fn encrypt(
        &self,
        source: &Path,
        disposition: &str,
    ) -> Result<EncryptedArtifact, EncryptionError>;
}
