//! Tag storage for assets. A tag set is unordered and holds each label once.

use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entity::asset_tag;

/// Attach one tag. Attaching a tag the asset already has is a no-op.
pub async fn add_tag<C: ConnectionTrait>(db: &C, asset_id: i32, tag: &str) -> Result<(), DbErr> {
    let name = tag.trim();
    if name.is_empty() {
        return Ok(());
    }

    let model = asset_tag::ActiveModel {
        asset_id: Set(asset_id),
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let result = asset_tag::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([asset_tag::Column::AssetId, asset_tag::Column::Name])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Replace the asset's whole tag set.
pub async fn set_tags<C: ConnectionTrait>(
    db: &C,
    asset_id: i32,
    tags: &[String],
) -> Result<(), DbErr> {
    remove_all(db, asset_id).await?;

    let unique: BTreeSet<&str> = tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    for tag in unique {
        add_tag(db, asset_id, tag).await?;
    }
    Ok(())
}

/// Tags of an asset, sorted.
pub async fn tags_for<C: ConnectionTrait>(db: &C, asset_id: i32) -> Result<Vec<String>, DbErr> {
    let rows = asset_tag::Entity::find()
        .filter(asset_tag::Column::AssetId.eq(asset_id))
        .order_by_asc(asset_tag::Column::Name)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|r| r.name).collect())
}

pub async fn remove_all<C: ConnectionTrait>(db: &C, asset_id: i32) -> Result<u64, DbErr> {
    let result = asset_tag::Entity::delete_many()
        .filter(asset_tag::Column::AssetId.eq(asset_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
