use chrono::Utc;
use common::SourceType;
use sea_orm::*;
use tracing::info;

use crate::entity::source;

/// Title of the source that always exists for single-file uploads.
pub const DEFAULT_SOURCE_TITLE: &str = "Manual";

/// Ensure the default manual source exists and return it.
///
/// Idempotent: an existing manual source named [`DEFAULT_SOURCE_TITLE`] is reused.
pub async fn seed_default_source<C: ConnectionTrait>(db: &C) -> Result<source::Model, DbErr> {
    let existing = source::Entity::find()
        .filter(source::Column::Title.eq(DEFAULT_SOURCE_TITLE))
        .filter(source::Column::SourceType.eq(SourceType::Manual))
        .order_by_asc(source::Column::Id)
        .one(db)
        .await?;

    if let Some(model) = existing {
        return Ok(model);
    }

    let now = Utc::now();
    let model = source::ActiveModel {
        title: Set(DEFAULT_SOURCE_TITLE.to_string()),
        source_type: Set(SourceType::Manual),
        url: Set(None),
        time_modified: Set(now),
        last_update: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Seeded default source {} ({})", model.title, model.id);
    Ok(model)
}
