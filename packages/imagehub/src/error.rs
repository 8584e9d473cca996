use common::storage::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

/// Fatal errors of the import engine.
///
/// Per-item problems (path conflicts, unresolved manifest entries) are not
/// errors: they are collected into the operation's report.
#[derive(Debug, Error)]
pub enum ImageHubError {
    #[error("Source not found: {0}")]
    SourceNotFound(i32),

    #[error("Asset not found: {0}")]
    AssetNotFound(i32),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("File already exists: {0}")]
    FileExists(String),

    #[error("Path conflict: {0}")]
    PathConflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ImageHubError {
    /// Whether the failure concerns a single item and the batch may go on.
    pub fn is_per_item(&self) -> bool {
        matches!(self, Self::PathConflict(_) | Self::FileExists(_))
    }
}
