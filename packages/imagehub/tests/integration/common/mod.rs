use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::Arc;

use common::SourceType;
use common::storage::filesystem::FilesystemBlobStore;
use tempfile::TempDir;

use imagehub::ImageHub;
use imagehub::config::{DatabaseConfig, HubConfig, ImportConfig, StorageConfig};
use imagehub::entity::stored_file::{self, Area};
use imagehub::files::{FileAttributes, FileLocation};
use imagehub::models::asset::AssetView;
use imagehub::models::source::NewSource;
use imagehub::utils::filename::split_dir_filename;

/// An engine over a throwaway SQLite database and blob directory.
pub struct TestHub {
    pub hub: ImageHub,
    /// Kept alive for the lifetime of the test.
    pub dir: TempDir,
}

impl TestHub {
    pub async fn spawn() -> Self {
        Self::spawn_with(ImportConfig::default()).await
    }

    pub async fn spawn_with(import: ImportConfig) -> Self {
        Self::spawn_with_limits(import, 16 * 1024 * 1024).await
    }

    pub async fn spawn_with_limits(import: ImportConfig, max_blob_size: u64) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let database = Self::database_config(&dir);

        let db = imagehub::database::init_db(&database)
            .await
            .expect("Failed to initialize test database");
        let blobs = FilesystemBlobStore::new(dir.path().join("blobs"), max_blob_size)
            .await
            .expect("Failed to create blob store");

        let hub = ImageHub::new(db, Arc::new(blobs), import);
        Self { hub, dir }
    }

    fn database_config(dir: &TempDir) -> DatabaseConfig {
        DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display()),
            max_connections: 1,
            log_queries: false,
        }
    }

    /// A full configuration pointing into this hub's temp dir.
    pub fn hub_config(&self, name: &str) -> HubConfig {
        HubConfig {
            database: DatabaseConfig {
                url: format!(
                    "sqlite://{}?mode=rwc",
                    self.dir.path().join(format!("{name}.db")).display()
                ),
                max_connections: 1,
                log_queries: false,
            },
            storage: StorageConfig {
                blob_dir: self.dir.path().join(format!("{name}-blobs")),
                ..Default::default()
            },
            import: ImportConfig::default(),
        }
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.dir.path().join("blobs")
    }

    pub async fn create_source(&self, title: &str) -> i32 {
        self.hub
            .create_source(NewSource::new(title, SourceType::Zip))
            .await
            .expect("Failed to create source")
            .id
    }

    /// Write files into the source's draft area and return its root
    /// directory. Existing files get their content replaced.
    pub async fn stage(&self, source_id: i32, files: &[(&str, &[u8])]) -> stored_file::Model {
        let storage = self.hub.files();
        for (path, data) in files {
            let (filepath, filename) = split_dir_filename(path).expect("Bad staged path");
            let location = FileLocation::new(Area::Draft, source_id, &filepath, &filename)
                .expect("Bad staged location");
            match storage.get_file(&location).await.unwrap() {
                Some(existing) => {
                    storage.replace_content(&existing, data).await.unwrap();
                }
                None => {
                    storage
                        .put_file(&location, data, FileAttributes::default())
                        .await
                        .unwrap();
                }
            }
        }
        storage
            .create_directory(Area::Draft, source_id, "/")
            .await
            .unwrap()
    }

    /// Empty the draft area.
    pub async fn clear_stage(&self, source_id: i32) {
        self.hub
            .files()
            .delete_area(Area::Draft, source_id)
            .await
            .unwrap();
    }

    /// The asset at `path` (e.g. `/cats/a.png`) in a source.
    pub async fn asset_at(&self, source_id: i32, path: &str) -> Option<AssetView> {
        self.hub
            .list_assets(source_id)
            .await
            .unwrap()
            .into_iter()
            .find(|a| a.path == path)
    }

    pub async fn asset_paths(&self, source_id: i32) -> Vec<String> {
        self.hub
            .list_assets(source_id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.path)
            .collect()
    }

    /// Every entry of the source's scratch area, directories included.
    pub async fn scratch_entries(&self, source_id: i32) -> Vec<stored_file::Model> {
        self.hub
            .files()
            .list_area(Area::Scratch, source_id)
            .await
            .unwrap()
    }
}

/// Build an in-memory ZIP. Names ending with `/` become directory entries.
pub fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for (name, content) in files {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}
