use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// The `images` area file this asset describes. One asset per file.
    #[sea_orm(unique)]
    pub file_id: Uuid,
    #[sea_orm(belongs_to, from = "file_id", to = "id")]
    pub file: HasOne<super::stored_file::Entity>,

    #[sea_orm(indexed)]
    pub source_id: i32,
    #[sea_orm(belongs_to, from = "source_id", to = "id")]
    pub source: HasOne<super::source::Entity>,

    /// Display override; readers fall back to the filename.
    pub title: Option<String>,

    #[sea_orm(has_many)]
    pub tags: HasMany<super::asset_tag::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
