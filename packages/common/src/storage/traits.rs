use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::key::StorageKey;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Byte storage for uploaded blobs, addressed by [`StorageKey`].
///
/// Metadata (original name, content type, folder) is not kept here.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store data from an async reader under `key` and return the byte count.
    async fn put_stream(&self, key: &StorageKey, reader: BoxReader) -> Result<u64, StorageError>;

    /// Retrieve a blob as a streaming async reader.
    async fn get_stream(&self, key: &StorageKey) -> Result<BoxReader, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, key: &StorageKey) -> Result<bool, StorageError>;

    /// Get the size of a blob in bytes.
    async fn size(&self, key: &StorageKey) -> Result<u64, StorageError>;

    /// Every key currently holding bytes, in no particular order.
    async fn keys(&self) -> Result<Vec<StorageKey>, StorageError>;
}
