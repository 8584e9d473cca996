//! Source registry: the named subtrees assets are imported into.

use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::stored_file::Area;
use crate::entity::{asset, source};
use crate::error::ImageHubError;
use crate::hub::ImageHub;
use crate::models::source::{NewSource, SourceChanges, validate_source_title};
use crate::seed::seed_default_source;

impl ImageHub {
    pub async fn get_source(&self, source_id: i32) -> Result<source::Model, ImageHubError> {
        source::Entity::find_by_id(source_id)
            .one(&self.db)
            .await?
            .ok_or(ImageHubError::SourceNotFound(source_id))
    }

    pub async fn list_sources(&self) -> Result<Vec<source::Model>, ImageHubError> {
        Ok(source::Entity::find()
            .order_by_asc(source::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Register a source and create its empty root directory.
    #[instrument(skip(self, input), fields(title = %input.title, source_type = %input.source_type))]
    pub async fn create_source(&self, input: NewSource) -> Result<source::Model, ImageHubError> {
        let title = validate_source_title(&input.title).map_err(ImageHubError::Validation)?;

        let now = Utc::now();
        let model = source::ActiveModel {
            title: Set(title.to_string()),
            source_type: Set(input.source_type),
            url: Set(input.url),
            time_modified: Set(now),
            last_update: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        self.files
            .create_directory(Area::Images, model.id, "/")
            .await?;

        info!("Created source {} ({})", model.title, model.id);
        Ok(model)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_source(
        &self,
        source_id: i32,
        changes: SourceChanges,
    ) -> Result<source::Model, ImageHubError> {
        let existing = self.get_source(source_id).await?;
        let mut active: source::ActiveModel = existing.into();

        if let Some(title) = changes.title {
            let title = validate_source_title(&title).map_err(ImageHubError::Validation)?;
            active.title = Set(title.to_string());
        }
        if let Some(source_type) = changes.source_type {
            active.source_type = Set(source_type);
        }
        if let Some(url) = changes.url {
            active.url = Set(url);
        }
        let now = Utc::now();
        active.time_modified = Set(now);
        active.last_update = Set(now);

        Ok(active.update(&self.db).await?)
    }

    /// Delete a source with every asset, tag and file it owns.
    ///
    /// Blobs are left for [`FileStorage::collect_garbage`](crate::files::FileStorage::collect_garbage).
    #[instrument(skip(self))]
    pub async fn delete_source(&self, source_id: i32) -> Result<(), ImageHubError> {
        let existing = self.get_source(source_id).await?;

        let assets = asset::Entity::find()
            .filter(asset::Column::SourceId.eq(source_id))
            .all(&self.db)
            .await?;
        for asset in &assets {
            self.purge_asset(asset).await?;
        }

        let images = self.files.delete_area(Area::Images, source_id).await?;
        let scratch = self.files.delete_area(Area::Scratch, source_id).await?;
        let draft = self.files.delete_area(Area::Draft, source_id).await?;
        source::Entity::delete_by_id(source_id)
            .exec(&self.db)
            .await?;

        info!(
            assets = assets.len(),
            files = images + scratch + draft,
            "Deleted source {} ({})",
            existing.title,
            source_id
        );
        Ok(())
    }

    /// The built-in manual source, created on first use.
    pub async fn ensure_default_source(&self) -> Result<source::Model, ImageHubError> {
        let model = seed_default_source(&self.db).await?;
        self.files
            .create_directory(Area::Images, model.id, "/")
            .await?;
        Ok(model)
    }

    /// Mark a source as synchronized now.
    pub(crate) async fn touch_source(&self, source: source::Model) -> Result<(), ImageHubError> {
        let mut active: source::ActiveModel = source.into();
        active.last_update = Set(Utc::now());
        active.update(&self.db).await?;
        Ok(())
    }
}
