use common::SourceType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "source")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub source_type: SourceType,

    /// Reserved for web/git ingestion, which is not implemented.
    pub url: Option<String>,

    #[sea_orm(has_many)]
    pub assets: HasMany<super::asset::Entity>,

    pub time_modified: DateTimeUtc,
    pub last_update: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
