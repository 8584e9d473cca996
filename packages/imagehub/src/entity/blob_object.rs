use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per distinct blob held by the blob store.
///
/// Rows outlive the files that reference them until garbage collection.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blob_object")]
pub struct Model {
    /// SHA-256 content hash, lowercase hex.
    #[sea_orm(primary_key, auto_increment = false)]
    pub content_hash: String,

    pub size: i64,

    #[sea_orm(has_many)]
    pub files: HasMany<super::stored_file::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
