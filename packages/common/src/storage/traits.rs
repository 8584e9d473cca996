use async_trait::async_trait;

use super::error::StorageError;
use super::hash::ContentHash;

/// Content-addressed blob storage.
///
/// Blobs are immutable: storing the same bytes twice yields the same digest
/// and keeps a single copy.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return their digest.
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StorageError>;

    /// Retrieve all bytes for a blob.
    ///
    /// Implementations verify the bytes against `hash` and report
    /// [`StorageError::Corrupted`] on mismatch.
    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError>;

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    /// Size of a blob in bytes.
    async fn size(&self, hash: &ContentHash) -> Result<u64, StorageError>;

    /// Largest blob `put` accepts, if the store has a limit.
    fn max_size(&self) -> Option<u64> {
        None
    }
}
