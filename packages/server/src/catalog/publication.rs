use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CatalogError;
use crate::entity::publication;

/// Lifecycle state of a publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    Draft,
    Encrypting,
    Error,
    Ok,
}

impl PublicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Encrypting => "encrypting",
            Self::Error => "error",
            Self::Ok => "ok",
        }
    }
}

impl fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "encrypting" => Ok(Self::Encrypting),
            "error" => Ok(Self::Error),
            "ok" => Ok(Self::Ok),
            other => Err(format!("unknown publication status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationRecord {
    pub id: i64,
    pub uuid: Uuid,
    pub title: String,
    pub status: PublicationStatus,
    pub master_filename: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<publication::Model> for PublicationRecord {
    type Error = CatalogError;

    fn try_from(model: publication::Model) -> Result<Self, Self::Error> {
        let status = model
            .status
            .parse()
            .map_err(|e| CatalogError::Corrupt(format!("publication {}: {e}", model.id)))?;
        Ok(Self {
            id: model.id,
            uuid: model.uuid,
            title: model.title,
            status,
            master_filename: model.master_filename,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Fields supplied when a publication row is first written.
#[derive(Debug, Clone)]
pub struct NewPublication {
    pub uuid: Uuid,
    pub title: String,
    pub status: PublicationStatus,
    pub master_filename: String,
}

#[async_trait]
pub trait PublicationCatalog: Send + Sync {
    /// One page of publications ordered by id; `page_index` is 0-based.
    async fn list(
        &self,
        page_index: u64,
        per_page: u64,
    ) -> Result<Vec<PublicationRecord>, CatalogError>;

    async fn get(&self, id: i64) -> Result<PublicationRecord, CatalogError>;

    /// Exact title match. The oldest row wins when titles collide.
    async fn get_by_title(&self, title: &str) -> Result<PublicationRecord, CatalogError>;

    async fn insert(&self, new: NewPublication) -> Result<PublicationRecord, CatalogError>;

    /// Replace the title of an existing row; the status is left alone.
    async fn update_title(&self, id: i64, title: &str)
    -> Result<PublicationRecord, CatalogError>;

    async fn delete(&self, id: i64) -> Result<(), CatalogError>;
}

pub struct SeaPublicationCatalog {
    db: DatabaseConnection,
}

impl SeaPublicationCatalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: i64) -> Result<publication::Model, CatalogError> {
        publication::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("publication {id}")))
    }
}

#[async_trait]
impl PublicationCatalog for SeaPublicationCatalog {
    async fn list(
        &self,
        page_index: u64,
        per_page: u64,
    ) -> Result<Vec<PublicationRecord>, CatalogError> {
        publication::Entity::find()
            .order_by_asc(publication::Column::Id)
            .offset(page_index.saturating_mul(per_page))
            .limit(per_page)
            .all(&self.db)
            .await?
            .into_iter()
            .map(PublicationRecord::try_from)
            .collect()
    }

    async fn get(&self, id: i64) -> Result<PublicationRecord, CatalogError> {
        self.find_model(id).await?.try_into()
    }

    async fn get_by_title(&self, title: &str) -> Result<PublicationRecord, CatalogError> {
        publication::Entity::find()
            .filter(publication::Column::Title.eq(title))
            .order_by_asc(publication::Column::Id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("publication titled {title:?}")))?
            .try_into()
    }

    async fn insert(&self, new: NewPublication) -> Result<PublicationRecord, CatalogError> {
        let now = Utc::now();
        let model = publication::ActiveModel {
            uuid: Set(new.uuid),
            title: Set(new.title),
            status: Set(new.status.to_string()),
            master_filename: Set(new.master_filename),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        model.insert(&self.db).await?.try_into()
    }

    async fn update_title(
        &self,
        id: i64,
        title: &str,
    ) -> Result<PublicationRecord, CatalogError> {
        let mut active = self.find_model(id).await?.into_active_model();
        active.title = Set(title.to_string());
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?.try_into()
    }

    async fn delete(&self, id: i64) -> Result<(), CatalogError> {
        let result = publication::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(CatalogError::NotFound(format!("publication {id}")));
        }
        Ok(())
    }
}
