//! Relational catalogs backing the registry.
//!
//! Each catalog is a trait with a sea-orm implementation, so the
//! coordination logic can be exercised against in-memory stores.

mod content;
mod publication;

use sea_orm::DbErr;

pub use content::{ContentCatalog, ContentRecord, SeaContentCatalog, UNKNOWN_LENGTH};
pub use publication::{
    NewPublication, PublicationCatalog, PublicationRecord, PublicationStatus,
    SeaPublicationCatalog,
};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("record already exists: {0}")]
    AlreadyExists(String),
    #[error("corrupt catalog row: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}
