//! Logical file layer: `(area, item, filepath, filename)` locations backed by
//! a content-addressed [`BlobStore`].
//!
//! A location holds a reference to a digest, never the bytes themselves, so
//! copying a file between locations is a row insert and two locations with
//! the same content share one blob. Blobs without references are reclaimed
//! by [`FileStorage::collect_garbage`].

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use common::storage::{BlobStore, ContentHash};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entity::stored_file::{self, Area};
use crate::entity::blob_object;
use crate::error::ImageHubError;
use crate::utils::filename::{
    ancestor_dirs, normalize_filepath, parent_and_name, validate_flat_filename,
};

/// Filename of directory placeholder entries.
pub const DIRECTORY_MARKER: &str = ".";

/// Where a file lives. Always normalized.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileLocation {
    pub area: Area,
    pub item_id: i32,
    pub filepath: String,
    pub filename: String,
}

impl FileLocation {
    pub fn new(
        area: Area,
        item_id: i32,
        filepath: &str,
        filename: &str,
    ) -> Result<Self, ImageHubError> {
        let filepath = normalize_filepath(filepath)
            .map_err(|e| ImageHubError::Validation(e.to_string()))?;
        let filename = validate_flat_filename(filename)
            .map_err(|e| ImageHubError::Validation(e.message().to_string()))?
            .to_string();
        Ok(Self {
            area,
            item_id,
            filepath,
            filename,
        })
    }

    /// The asset location of a file inside a source.
    pub fn image(source_id: i32, filepath: &str, filename: &str) -> Result<Self, ImageHubError> {
        Self::new(Area::Images, source_id, filepath, filename)
    }

    /// `filepath` + `filename`.
    pub fn path(&self) -> String {
        format!("{}{}", self.filepath, self.filename)
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}{}{}", self.area, self.item_id, self.filepath, self.filename)
    }
}

/// Attribution stored alongside a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAttributes {
    pub author: Option<String>,
    pub license: Option<String>,
}

#[derive(Clone)]
pub struct FileStorage {
    db: DatabaseConnection,
    blobs: Arc<dyn BlobStore>,
}

impl FileStorage {
    pub fn new(db: DatabaseConnection, blobs: Arc<dyn BlobStore>) -> Self {
        Self { db, blobs }
    }

    pub fn blob_store(&self) -> &dyn BlobStore {
        &*self.blobs
    }

    /// Store bytes in the blob store and record the blob.
    async fn store_blob(&self, data: &[u8]) -> Result<(ContentHash, i64), ImageHubError> {
        let hash = self.blobs.put(data).await?;
        let size = i64::try_from(data.len()).unwrap_or(i64::MAX);

        let blob_obj = blob_object::ActiveModel {
            content_hash: Set(hash.to_hex()),
            size: Set(size),
            created_at: Set(Utc::now()),
        };
        let result = blob_object::Entity::insert(blob_obj)
            .on_conflict(
                OnConflict::column(blob_object::Column::ContentHash)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok((hash, size)),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_entry(
        &self,
        area: Area,
        item_id: i32,
        filepath: &str,
        filename: &str,
    ) -> Result<Option<stored_file::Model>, DbErr> {
        stored_file::Entity::find()
            .filter(stored_file::Column::Area.eq(area))
            .filter(stored_file::Column::ItemId.eq(item_id))
            .filter(stored_file::Column::Filepath.eq(filepath))
            .filter(stored_file::Column::Filename.eq(filename))
            .one(&self.db)
            .await
    }

    /// The file at `location`, if any. Never returns a directory.
    pub async fn get_file(
        &self,
        location: &FileLocation,
    ) -> Result<Option<stored_file::Model>, ImageHubError> {
        let entry = self
            .find_entry(
                location.area,
                location.item_id,
                &location.filepath,
                &location.filename,
            )
            .await?;
        Ok(entry.filter(|f| !f.is_directory))
    }

    /// The placeholder entry of a directory, if the directory exists.
    pub async fn get_directory(
        &self,
        area: Area,
        item_id: i32,
        filepath: &str,
    ) -> Result<Option<stored_file::Model>, ImageHubError> {
        let filepath =
            normalize_filepath(filepath).map_err(|e| ImageHubError::Validation(e.to_string()))?;
        Ok(self
            .find_entry(area, item_id, &filepath, DIRECTORY_MARKER)
            .await?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<stored_file::Model>, ImageHubError> {
        Ok(stored_file::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Fails with `PathConflict` when a directory holding files already
    /// occupies the file's name, or a file occupies one of its parent
    /// directories. A directory left empty is removed instead.
    async fn check_placement(&self, location: &FileLocation) -> Result<(), ImageHubError> {
        let as_directory = format!("{}{}/", location.filepath, location.filename);
        if self
            .find_entry(location.area, location.item_id, &as_directory, DIRECTORY_MARKER)
            .await?
            .is_some()
        {
            let files = self
                .list_files(location.area, location.item_id, &as_directory)
                .await?;
            if !files.is_empty() {
                return Err(ImageHubError::PathConflict(format!(
                    "{location} is a directory"
                )));
            }
            self.remove_empty_directory(location.area, location.item_id, &as_directory)
                .await?;
        }
        self.check_parents(location.area, location.item_id, &location.filepath)
            .await
    }

    /// Drop the placeholders of `filepath` and its subdirectories. Callers
    /// make sure no file lives below it.
    async fn remove_empty_directory(
        &self,
        area: Area,
        item_id: i32,
        filepath: &str,
    ) -> Result<(), ImageHubError> {
        let placeholders: Vec<_> = self
            .list_area(area, item_id)
            .await?
            .into_iter()
            .filter(|f| f.is_directory && f.filepath.starts_with(filepath))
            .map(|f| f.id)
            .collect();

        stored_file::Entity::delete_many()
            .filter(stored_file::Column::Id.is_in(placeholders))
            .exec(&self.db)
            .await?;
        debug!(directory = %format!("{area}/{item_id}{filepath}"), "removed empty directory");
        Ok(())
    }

    async fn check_parents(
        &self,
        area: Area,
        item_id: i32,
        filepath: &str,
    ) -> Result<(), ImageHubError> {
        for dir in ancestor_dirs(filepath) {
            let Some((parent, name)) = parent_and_name(&dir) else {
                continue;
            };
            if let Some(file) = self.find_entry(area, item_id, &parent, &name).await?
                && !file.is_directory
            {
                return Err(ImageHubError::PathConflict(format!(
                    "{} is a file",
                    file.logical_path()
                )));
            }
        }
        Ok(())
    }

    /// Create a directory and its missing ancestors.
    pub async fn create_directory(
        &self,
        area: Area,
        item_id: i32,
        filepath: &str,
    ) -> Result<stored_file::Model, ImageHubError> {
        let filepath =
            normalize_filepath(filepath).map_err(|e| ImageHubError::Validation(e.to_string()))?;
        self.check_parents(area, item_id, &filepath).await?;

        let now = Utc::now();
        for dir in ancestor_dirs(&filepath) {
            let placeholder = stored_file::ActiveModel {
                id: Set(Uuid::now_v7()),
                area: Set(area),
                item_id: Set(item_id),
                filepath: Set(dir),
                filename: Set(DIRECTORY_MARKER.to_string()),
                is_directory: Set(true),
                content_hash: Set(None),
                size: Set(0),
                content_type: Set(None),
                author: Set(None),
                license: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            };
            let result = stored_file::Entity::insert(placeholder)
                .on_conflict(
                    OnConflict::columns([
                        stored_file::Column::Area,
                        stored_file::Column::ItemId,
                        stored_file::Column::Filepath,
                        stored_file::Column::Filename,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&self.db)
                .await;
            match result {
                Ok(_) | Err(DbErr::RecordNotInserted) => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.find_entry(area, item_id, &filepath, DIRECTORY_MARKER)
            .await?
            .ok_or_else(|| {
                ImageHubError::Database(DbErr::RecordNotFound(format!(
                    "directory {area}/{item_id}{filepath} missing after insert"
                )))
            })
    }

    /// Store new bytes at an empty location.
    pub async fn put_file(
        &self,
        location: &FileLocation,
        data: &[u8],
        attributes: FileAttributes,
    ) -> Result<stored_file::Model, ImageHubError> {
        self.ensure_vacant(location).await?;
        let (hash, size) = self.store_blob(data).await?;
        self.insert_file(location, hash.to_hex(), size, attributes)
            .await
    }

    /// Place an existing file's content at an empty location without copying
    /// bytes. Attribution is inherited from `source`.
    pub async fn link_file(
        &self,
        location: &FileLocation,
        source: &stored_file::Model,
    ) -> Result<stored_file::Model, ImageHubError> {
        let hash = source
            .content_hash
            .clone()
            .ok_or_else(|| ImageHubError::Validation(format!("{} has no content", source.logical_path())))?;
        self.ensure_vacant(location).await?;
        let attributes = FileAttributes {
            author: source.author.clone(),
            license: source.license.clone(),
        };
        self.insert_file(location, hash, source.size, attributes)
            .await
    }

    async fn ensure_vacant(&self, location: &FileLocation) -> Result<(), ImageHubError> {
        let existing = self
            .find_entry(
                location.area,
                location.item_id,
                &location.filepath,
                &location.filename,
            )
            .await?;
        if existing.is_some() {
            return Err(ImageHubError::FileExists(location.to_string()));
        }
        self.check_placement(location).await
    }

    async fn insert_file(
        &self,
        location: &FileLocation,
        content_hash: String,
        size: i64,
        attributes: FileAttributes,
    ) -> Result<stored_file::Model, ImageHubError> {
        self.create_directory(location.area, location.item_id, &location.filepath)
            .await?;

        let content_type = mime_guess::from_path(&location.filename)
            .first()
            .map(|m| m.to_string());
        let now = Utc::now();

        let model = stored_file::ActiveModel {
            id: Set(Uuid::now_v7()),
            area: Set(location.area),
            item_id: Set(location.item_id),
            filepath: Set(location.filepath.clone()),
            filename: Set(location.filename.clone()),
            is_directory: Set(false),
            content_hash: Set(Some(content_hash)),
            size: Set(size),
            content_type: Set(content_type),
            author: Set(attributes.author),
            license: Set(attributes.license),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        debug!(location = %location, "stored file");
        Ok(model)
    }

    /// Point `file` at new bytes. Id, location and attribution are kept.
    pub async fn replace_content(
        &self,
        file: &stored_file::Model,
        data: &[u8],
    ) -> Result<stored_file::Model, ImageHubError> {
        let (hash, size) = self.store_blob(data).await?;
        self.set_content(file, hash.to_hex(), size).await
    }

    /// Point `target` at the content of `source`.
    pub async fn replace_with(
        &self,
        target: &stored_file::Model,
        source: &stored_file::Model,
    ) -> Result<stored_file::Model, ImageHubError> {
        let hash = source
            .content_hash
            .clone()
            .ok_or_else(|| ImageHubError::Validation(format!("{} has no content", source.logical_path())))?;
        self.set_content(target, hash, source.size).await
    }

    async fn set_content(
        &self,
        file: &stored_file::Model,
        content_hash: String,
        size: i64,
    ) -> Result<stored_file::Model, ImageHubError> {
        let mut active: stored_file::ActiveModel = file.clone().into();
        active.content_hash = Set(Some(content_hash));
        active.size = Set(size);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.db).await?)
    }

    /// Update attribution; `None` fields are left as they are.
    pub async fn set_attribution(
        &self,
        file: &stored_file::Model,
        author: Option<String>,
        license: Option<String>,
    ) -> Result<stored_file::Model, ImageHubError> {
        if author.is_none() && license.is_none() {
            return Ok(file.clone());
        }
        let mut active: stored_file::ActiveModel = file.clone().into();
        if let Some(author) = author {
            active.author = Set(Some(author));
        }
        if let Some(license) = license {
            active.license = Set(Some(license));
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.db).await?)
    }

    /// The file's digest; `None` for directories.
    pub fn digest(file: &stored_file::Model) -> Result<Option<ContentHash>, ImageHubError> {
        file.content_hash
            .as_deref()
            .map(ContentHash::from_hex)
            .transpose()
            .map_err(ImageHubError::from)
    }

    pub async fn read_content(&self, file: &stored_file::Model) -> Result<Vec<u8>, ImageHubError> {
        let hash = Self::digest(file)?.ok_or_else(|| {
            ImageHubError::Validation(format!("{} is a directory", file.logical_path()))
        })?;
        Ok(self.blobs.get(&hash).await?)
    }

    /// Drop the reference. The blob stays until garbage collection.
    pub async fn delete_file(&self, file: &stored_file::Model) -> Result<(), ImageHubError> {
        stored_file::Entity::delete_by_id(file.id)
            .exec(&self.db)
            .await?;
        debug!(path = %file.logical_path(), "deleted file");
        Ok(())
    }

    /// Delete every entry of an area subtree, directories included.
    pub async fn delete_area(&self, area: Area, item_id: i32) -> Result<u64, ImageHubError> {
        let result = stored_file::Entity::delete_many()
            .filter(stored_file::Column::Area.eq(area))
            .filter(stored_file::Column::ItemId.eq(item_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Files (not directories) under `under`, recursively, ordered by path.
    pub async fn list_files(
        &self,
        area: Area,
        item_id: i32,
        under: &str,
    ) -> Result<Vec<stored_file::Model>, ImageHubError> {
        let under =
            normalize_filepath(under).map_err(|e| ImageHubError::Validation(e.to_string()))?;
        let files = stored_file::Entity::find()
            .filter(stored_file::Column::Area.eq(area))
            .filter(stored_file::Column::ItemId.eq(item_id))
            .filter(stored_file::Column::IsDirectory.eq(false))
            .order_by_asc(stored_file::Column::Filepath)
            .order_by_asc(stored_file::Column::Filename)
            .all(&self.db)
            .await?;
        Ok(files
            .into_iter()
            .filter(|f| f.filepath.starts_with(&under))
            .collect())
    }

    /// Every entry of an area subtree, directories included.
    pub async fn list_area(
        &self,
        area: Area,
        item_id: i32,
    ) -> Result<Vec<stored_file::Model>, ImageHubError> {
        Ok(stored_file::Entity::find()
            .filter(stored_file::Column::Area.eq(area))
            .filter(stored_file::Column::ItemId.eq(item_id))
            .order_by_asc(stored_file::Column::Filepath)
            .order_by_asc(stored_file::Column::Filename)
            .all(&self.db)
            .await?)
    }

    /// Delete blobs no file refers to. Returns how many were removed.
    pub async fn collect_garbage(&self) -> Result<u64, ImageHubError> {
        let blobs = blob_object::Entity::find().all(&self.db).await?;
        let mut removed = 0u64;

        for blob in blobs {
            let references = stored_file::Entity::find()
                .filter(stored_file::Column::ContentHash.eq(&blob.content_hash))
                .count(&self.db)
                .await?;
            if references > 0 {
                continue;
            }

            let hash = ContentHash::from_hex(&blob.content_hash)?;
            blob_object::Entity::delete_by_id(blob.content_hash.clone())
                .exec(&self.db)
                .await?;
            self.blobs.delete(&hash).await?;
            removed += 1;
        }

        if removed > 0 {
            info!("Collected {} unreferenced blobs", removed);
        }
        Ok(removed)
    }
}
