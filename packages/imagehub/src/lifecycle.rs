//! Single-asset operations outside of bulk import.

use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{asset, stored_file};
use crate::error::ImageHubError;
use crate::files::{FileAttributes, FileLocation};
use crate::hub::ImageHub;
use crate::models::asset::{AssetPatch, AssetView, NewAssetMetadata, Upload};
use crate::tags;

impl ImageHub {
    /// Store one uploaded file under `filepath` in a source and register it
    /// as an asset with the given metadata.
    #[instrument(skip(self, upload, metadata), fields(filename = %upload.filename, size = upload.data.len()))]
    pub async fn add_item(
        &self,
        upload: Upload,
        filepath: &str,
        source_id: i32,
        metadata: NewAssetMetadata,
    ) -> Result<AssetView, ImageHubError> {
        self.get_source(source_id).await?;
        let patch = AssetPatch::from(metadata)
            .validate()
            .map_err(ImageHubError::Validation)?;
        let location = FileLocation::image(source_id, filepath, &upload.filename)?;

        let attributes = FileAttributes {
            author: patch.author.clone().filter(|a| !a.is_empty()),
            license: patch.license.clone().filter(|l| !l.is_empty()),
        };
        let file = self
            .files
            .put_file(&location, &upload.data, attributes)
            .await?;

        let title = patch.title.filter(|t| !t.is_empty());
        let asset = self.insert_asset(&file, source_id, title).await?;
        if let Some(tags) = &patch.tags {
            tags::set_tags(&self.db, asset.id, tags).await?;
        }

        info!("Added asset {} at {}", asset.id, location);
        self.view(asset).await
    }

    /// Delete an asset: its tags, its row and its stored file.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, asset_id: i32) -> Result<(), ImageHubError> {
        let asset = self.find_asset(asset_id).await?;
        self.purge_asset(&asset).await?;
        info!("Removed asset {}", asset_id);
        Ok(())
    }

    /// Partial update. Fields absent from `patch` are left untouched and
    /// `tags`, when present, replaces the whole tag set.
    #[instrument(skip(self, patch))]
    pub async fn update_asset(
        &self,
        asset_id: i32,
        patch: AssetPatch,
    ) -> Result<AssetView, ImageHubError> {
        let patch = patch.validate().map_err(ImageHubError::Validation)?;
        let asset = self.find_asset(asset_id).await?;
        let asset = self.apply_patch(asset, patch).await?;
        self.view(asset).await
    }

    pub async fn get_asset(&self, asset_id: i32) -> Result<AssetView, ImageHubError> {
        let asset = self.find_asset(asset_id).await?;
        self.view(asset).await
    }

    /// Assets of a source ordered by path.
    pub async fn list_assets(&self, source_id: i32) -> Result<Vec<AssetView>, ImageHubError> {
        self.get_source(source_id).await?;
        let assets = asset::Entity::find()
            .filter(asset::Column::SourceId.eq(source_id))
            .order_by_asc(asset::Column::Id)
            .all(&self.db)
            .await?;

        let mut views = Vec::with_capacity(assets.len());
        for asset in assets {
            views.push(self.view(asset).await?);
        }
        views.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(views)
    }

    /// Apply an already validated patch.
    pub(crate) async fn apply_patch(
        &self,
        asset: asset::Model,
        patch: AssetPatch,
    ) -> Result<asset::Model, ImageHubError> {
        let asset = match patch.title {
            Some(title) => {
                let mut active: asset::ActiveModel = asset.into();
                active.title = Set(Some(title).filter(|t| !t.is_empty()));
                active.updated_at = Set(Utc::now());
                active.update(&self.db).await?
            }
            None => asset,
        };

        if let Some(tags) = &patch.tags {
            tags::set_tags(&self.db, asset.id, tags).await?;
        }

        if patch.author.is_some() || patch.license.is_some() {
            let file = self.asset_file(&asset).await?;
            self.files
                .set_attribution(&file, patch.author, patch.license)
                .await?;
        }

        Ok(asset)
    }

    pub(crate) async fn find_asset(&self, asset_id: i32) -> Result<asset::Model, ImageHubError> {
        asset::Entity::find_by_id(asset_id)
            .one(&self.db)
            .await?
            .ok_or(ImageHubError::AssetNotFound(asset_id))
    }

    pub(crate) async fn asset_for_file(
        &self,
        file: &stored_file::Model,
    ) -> Result<Option<asset::Model>, ImageHubError> {
        Ok(asset::Entity::find()
            .filter(asset::Column::FileId.eq(file.id))
            .one(&self.db)
            .await?)
    }

    pub(crate) async fn insert_asset(
        &self,
        file: &stored_file::Model,
        source_id: i32,
        title: Option<String>,
    ) -> Result<asset::Model, ImageHubError> {
        let now = Utc::now();
        Ok(asset::ActiveModel {
            file_id: Set(file.id),
            source_id: Set(source_id),
            title: Set(title),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?)
    }

    /// Remove tags, row and stored file of an asset, in that order.
    pub(crate) async fn purge_asset(&self, asset: &asset::Model) -> Result<(), ImageHubError> {
        tags::remove_all(&self.db, asset.id).await?;
        asset::Entity::delete_by_id(asset.id)
            .exec(&self.db)
            .await?;
        if let Some(file) = self.files.get_by_id(asset.file_id).await? {
            self.files.delete_file(&file).await?;
        }
        Ok(())
    }

    async fn asset_file(&self, asset: &asset::Model) -> Result<stored_file::Model, ImageHubError> {
        self.files.get_by_id(asset.file_id).await?.ok_or_else(|| {
            ImageHubError::Database(DbErr::RecordNotFound(format!(
                "file {} of asset {}",
                asset.file_id, asset.id
            )))
        })
    }

    pub(crate) async fn view(&self, asset: asset::Model) -> Result<AssetView, ImageHubError> {
        let file = self.asset_file(&asset).await?;
        let tags = tags::tags_for(&self.db, asset.id).await?;
        Ok(AssetView::new(asset, file, tags))
    }
}
