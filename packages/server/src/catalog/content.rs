use async_trait::async_trait;
use chrono::Utc;
use quire_common::ArtifactId;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};

use super::CatalogError;
use crate::encryption::EncryptedArtifact;
use crate::entity::content;

/// Length recorded when the encrypter did not report one.
pub const UNKNOWN_LENGTH: i64 = -1;

/// Metadata for one registered artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub id: ArtifactId,
    pub encryption_key: Vec<u8>,
    /// Disposition name; empty when unknown.
    pub location: String,
    /// Byte length; [`UNKNOWN_LENGTH`] when unknown.
    pub length: i64,
    /// Hex SHA-256; empty when unknown.
    pub sha256: String,
}

impl ContentRecord {
    /// Build the full replacement record for `id` from an encryption result.
    ///
    /// Every mutable field is taken from `artifact`; fields it leaves out are
    /// reset to their unknown sentinel rather than kept from a previous row.
    pub fn from_artifact(id: ArtifactId, artifact: &EncryptedArtifact) -> Self {
        Self {
            id,
            encryption_key: artifact.content_key.clone(),
            location: artifact.disposition.clone().unwrap_or_default(),
            length: artifact.length.unwrap_or(UNKNOWN_LENGTH),
            sha256: artifact.sha256.clone().unwrap_or_default(),
        }
    }

    pub fn known_length(&self) -> Option<u64> {
        u64::try_from(self.length).ok()
    }
}

impl TryFrom<content::Model> for ContentRecord {
    type Error = CatalogError;

    fn try_from(model: content::Model) -> Result<Self, Self::Error> {
        let id = ArtifactId::parse(&model.id)
            .map_err(|e| CatalogError::Corrupt(format!("content {:?}: {e}", model.id)))?;
        Ok(Self {
            id,
            encryption_key: model.encryption_key,
            location: model.location,
            length: model.length,
            sha256: model.sha256,
        })
    }
}

#[async_trait]
pub trait ContentCatalog: Send + Sync {
    async fn get(&self, id: &ArtifactId) -> Result<ContentRecord, CatalogError>;

    /// Insert a new record. Fails with `AlreadyExists` if the id is taken.
    async fn add(&self, record: &ContentRecord) -> Result<(), CatalogError>;

    /// Replace the mutable fields of an existing record.
    async fn update(&self, record: &ContentRecord) -> Result<(), CatalogError>;

    /// All records, oldest first.
    async fn list(&self) -> Result<Vec<ContentRecord>, CatalogError>;
}

pub struct SeaContentCatalog {
    db: DatabaseConnection,
}

impl SeaContentCatalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContentCatalog for SeaContentCatalog {
    async fn get(&self, id: &ArtifactId) -> Result<ContentRecord, CatalogError> {
        content::Entity::find_by_id(id.as_str())
            .one(&self.db)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?
            .try_into()
    }

    async fn add(&self, record: &ContentRecord) -> Result<(), CatalogError> {
        let now = Utc::now();
        let model = content::ActiveModel {
            id: Set(record.id.to_string()),
            encryption_key: Set(record.encryption_key.clone()),
            location: Set(record.location.clone()),
            length: Set(record.length),
            sha256: Set(record.sha256.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match content::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(CatalogError::AlreadyExists(record.id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, record: &ContentRecord) -> Result<(), CatalogError> {
        let result = content::Entity::update_many()
            .col_expr(
                content::Column::EncryptionKey,
                Expr::value(record.encryption_key.clone()),
            )
            .col_expr(content::Column::Location, Expr::value(record.location.clone()))
            .col_expr(content::Column::Length, Expr::value(record.length))
            .col_expr(content::Column::Sha256, Expr::value(record.sha256.clone()))
            .col_expr(content::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(content::Column::Id.eq(record.id.as_str()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(CatalogError::NotFound(record.id.to_string()));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ContentRecord>, CatalogError> {
        content::Entity::find()
            .order_by_asc(content::Column::CreatedAt)
            .order_by_asc(content::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(ContentRecord::try_from)
            .collect()
    }
}
