use std::sync::Arc;

use common::storage::BlobStore;
use common::storage::filesystem::FilesystemBlobStore;
use sea_orm::DatabaseConnection;

use crate::config::{HubConfig, ImportConfig};
use crate::database::init_db;
use crate::error::ImageHubError;
use crate::files::FileStorage;

/// Entry point of the import engine.
///
/// Holds explicit handles to the record store, the file layer and the import
/// limits. Cheap to clone.
#[derive(Clone)]
pub struct ImageHub {
    pub(crate) db: DatabaseConnection,
    pub(crate) files: FileStorage,
    pub(crate) config: ImportConfig,
}

impl ImageHub {
    /// Archive entries larger than the blob store accepts are rejected at
    /// extraction, so `config.max_file_size` is capped to the store's limit.
    pub fn new(
        db: DatabaseConnection,
        blobs: Arc<dyn BlobStore>,
        mut config: ImportConfig,
    ) -> Self {
        if let Some(limit) = blobs.max_size() {
            config.max_file_size = config.max_file_size.min(limit);
        }
        let files = FileStorage::new(db.clone(), blobs);
        Self { db, files, config }
    }

    /// Open the database and blob directory named by `config`, sync the
    /// schema and make sure the default source exists.
    pub async fn connect(config: &HubConfig) -> Result<Self, ImageHubError> {
        let db = init_db(&config.database).await?;
        let blobs = FilesystemBlobStore::new(
            config.storage.blob_dir.clone(),
            config.storage.max_blob_size,
        )
        .await?;

        let hub = Self::new(db, Arc::new(blobs), config.import.clone());
        hub.ensure_default_source().await?;
        Ok(hub)
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn files(&self) -> &FileStorage {
        &self.files
    }

    pub fn import_config(&self) -> &ImportConfig {
        &self.config
    }
}
