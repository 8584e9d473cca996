use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Connection URL. Default: "sqlite://imagehub.db?mode=rwc".
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Pool size. Default: 10.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Log every SQL statement through `tracing`. Default: false.
    #[serde(default)]
    pub log_queries: bool,
}

fn default_database_url() -> String {
    "sqlite://imagehub.db?mode=rwc".into()
}
fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            log_queries: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root of the content-addressed blob directory. Default: "./data/blobs".
    #[serde(default = "default_blob_dir")]
    pub blob_dir: PathBuf,
    /// Largest single blob accepted, in bytes. Default: 128 MiB.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
}

fn default_blob_dir() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_max_blob_size() -> u64 {
    128 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            blob_dir: default_blob_dir(),
            max_blob_size: default_max_blob_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Maximum decompressed size per archive entry. Default: 128 MiB.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Maximum total decompressed size per archive. Default: 2 GiB.
    #[serde(default = "default_max_total_size")]
    pub max_total_size: u64,
    /// Name of the per-directory metadata manifest. Default: "metadata.json".
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,
}

fn default_max_file_size() -> u64 {
    128 * 1024 * 1024
}
fn default_max_total_size() -> u64 {
    2048 * 1024 * 1024
}
fn default_manifest_name() -> String {
    "metadata.json".into()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            max_total_size: default_max_total_size(),
            manifest_name: default_manifest_name(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HubConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

impl HubConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Load from config/imagehub.toml
            .add_source(File::with_name("config/imagehub").required(false))
            // Override from environment (e.g., IMAGEHUB__STORAGE__BLOB_DIR)
            .add_source(Environment::with_prefix("IMAGEHUB").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Load from an explicit file, without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }
}
