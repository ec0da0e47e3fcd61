use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog row for one registered artifact.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content")]
pub struct Model {
    /// Artifact id; doubles as the blob store key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[serde(skip_serializing)]
    pub encryption_key: Vec<u8>,

    /// Disposition name; empty when unknown.
    pub location: String,

    /// Byte length of the encrypted payload; -1 when unknown.
    pub length: i64,

    /// Hex SHA-256 of the encrypted payload; empty when unknown.
    pub sha256: String,

    #[sea_orm(indexed)]
    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
