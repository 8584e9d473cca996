pub mod archive;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod files;
pub mod hub;
pub mod import;
pub mod lifecycle;
pub mod metadata;
pub mod models;
pub mod registry;
pub mod seed;
pub mod sync;
pub mod tags;
pub mod utils;

pub use error::ImageHubError;
pub use hub::ImageHub;
pub use sync::SyncCandidate;
