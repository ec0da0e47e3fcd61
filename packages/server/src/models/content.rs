use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::ContentRecord;
use crate::encryption::EncryptedArtifact;
use crate::error::AppError;

/// Registration payload describing an already-encrypted file on this host.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterContentRequest {
    /// Ignored; the id in the URL is authoritative.
    #[serde(rename = "content-id", default)]
    pub content_id: Option<String>,
    /// Base64-encoded content key.
    #[serde(rename = "content-encryption-key")]
    #[schema(example = "c2VjcmV0LWtleQ==")]
    pub content_key: String,
    /// Server-local path of the encrypted file.
    #[serde(rename = "protected-content-location")]
    #[schema(example = "/var/lib/quire/out/book.epub")]
    pub location: String,
    #[serde(rename = "protected-content-length", default)]
    #[schema(example = 1024)]
    pub length: Option<i64>,
    #[serde(rename = "protected-content-disposition", default)]
    #[schema(example = "moby-dick")]
    pub disposition: Option<String>,
    #[serde(rename = "protected-content-sha256", default)]
    #[schema(example = "deadbeef")]
    pub sha256: Option<String>,
}

impl RegisterContentRequest {
    pub fn into_artifact(self) -> Result<EncryptedArtifact, AppError> {
        if self.location.trim().is_empty() {
            return Err(AppError::Validation(
                "protected-content-location is required".into(),
            ));
        }
        let content_key = STANDARD.decode(self.content_key.trim()).map_err(|e| {
            AppError::Validation(format!("content-encryption-key is not valid base64: {e}"))
        })?;
        if content_key.is_empty() {
            return Err(AppError::Validation(
                "content-encryption-key must not be empty".into(),
            ));
        }
        Ok(EncryptedArtifact {
            path: PathBuf::from(self.location),
            content_key,
            sha256: self.sha256,
            length: self.length,
            disposition: self.disposition,
        })
    }
}

/// Catalogued content, without its key.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ContentResponse {
    #[schema(example = "9f0c1a52-2c4b-4d6e-8f10-0123456789ab")]
    pub id: String,
    /// Disposition name.
    #[schema(example = "moby-dick")]
    pub location: String,
    /// Byte length, or -1 when unknown.
    #[schema(example = 1024)]
    pub length: i64,
    /// Hex SHA-256, or empty when unknown.
    pub sha256: String,
}

impl From<ContentRecord> for ContentResponse {
    fn from(record: ContentRecord) -> Self {
        Self {
            id: record.id.into_string(),
            location: record.location,
            length: record.length,
            sha256: record.sha256,
        }
    }
}
