use sea_orm::entity::prelude::*;
use sea_orm::prelude::StringLen;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level namespace a file lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Area {
    /// Synchronized assets, one subtree per source.
    #[sea_orm(string_value = "images")]
    Images,
    /// Extracted archive contents awaiting synchronization.
    #[sea_orm(string_value = "temp")]
    Scratch,
    /// Host uploads waiting to be imported as a directory.
    #[sea_orm(string_value = "draft")]
    Draft,
}

impl Area {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Scratch => "temp",
            Self::Draft => "draft",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file or directory placeholder at a logical location.
///
/// Location is `(area, item_id, filepath, filename)`; `filepath` always starts
/// and ends with `/`. Directory placeholders use the filename `"."` and carry
/// no content.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stored_file")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique_key = "location")]
    pub area: Area,
    /// Source id that owns this subtree.
    #[sea_orm(unique_key = "location")]
    pub item_id: i32,
    #[sea_orm(unique_key = "location")]
    pub filepath: String,
    #[sea_orm(unique_key = "location")]
    pub filename: String,

    pub is_directory: bool,

    pub content_hash: Option<String>,
    #[sea_orm(belongs_to, from = "content_hash", to = "content_hash")]
    pub blob_object: Option<super::blob_object::Entity>,

    #[sea_orm(has_one)]
    pub asset: HasOne<super::asset::Entity>,

    pub size: i64,
    pub content_type: Option<String>,

    pub author: Option<String>,
    pub license: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// `filepath` + `filename`, e.g. `/cats/tabby.png`.
    pub fn path(&self) -> String {
        if self.is_directory {
            self.filepath.clone()
        } else {
            format!("{}{}", self.filepath, self.filename)
        }
    }

    /// `images/3/cats/tabby.png`.
    pub fn logical_path(&self) -> String {
        format!("{}/{}{}", self.area, self.item_id, self.path())
    }
}

impl ActiveModelBehavior for ActiveModel {}
