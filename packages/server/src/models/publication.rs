use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{PublicationRecord, PublicationStatus};

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicationResponse {
    #[schema(example = 1)]
    pub id: i64,
    pub uuid: Uuid,
    #[schema(example = "Moby Dick")]
    pub title: String,
    pub status: PublicationStatus,
    #[serde(rename = "masterFilename")]
    #[schema(example = "moby-dick.epub")]
    pub master_filename: String,
}

impl From<PublicationRecord> for PublicationResponse {
    fn from(record: PublicationRecord) -> Self {
        Self {
            id: record.id,
            uuid: record.uuid,
            title: record.title,
            status: record.status,
            master_filename: record.master_filename,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePublicationRequest {
    /// Publication title (1-256 characters).
    #[schema(example = "Moby Dick")]
    pub title: String,
    /// Name of a file in the master repository.
    #[serde(rename = "masterFilename")]
    #[schema(example = "moby-dick.epub")]
    pub master_filename: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdatePublicationRequest {
    #[schema(example = "Moby-Dick; or, The Whale")]
    pub title: String,
}

/// Title lookup / upload naming.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct TitleQuery {
    #[param(example = "Moby Dick")]
    pub title: String,
}

/// Artifact registered from an uploaded EPUB.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    /// Artifact id of the registered content.
    #[schema(example = "9f0c1a52-2c4b-4d6e-8f10-0123456789ab")]
    pub content_id: String,
    #[schema(example = "moby-dick")]
    pub disposition: String,
}
