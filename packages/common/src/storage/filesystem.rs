use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::key::StorageKey;
use super::traits::{BlobStore, BoxReader};

/// Filesystem-backed blob store.
///
/// Each blob lives at `{base_path}/{storage key}`. Writes are staged in
/// `{base_path}/.tmp` and renamed into place, so readers never observe a
/// partially written blob.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn blob_path(&self, key: &StorageKey) -> PathBuf {
        self.base_path.join(key.as_str())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_stream(
        &self,
        key: &StorageKey,
        mut reader: BoxReader,
    ) -> Result<u64, StorageError> {
        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer
        let mut temp_file = fs::File::create(&temp_path).await?;

        let copied: Result<(), StorageError> = async {
            loop {
                let n = reader.read(&mut buf).await?;
                if n == 0 {
                    break;
                }

                total_bytes += n as u64;
                if total_bytes > self.max_size {
                    return Err(StorageError::SizeLimitExceeded {
                        actual: total_bytes,
                        limit: self.max_size,
                    });
                }

                temp_file.write_all(&buf[..n]).await?;
            }
            temp_file.flush().await?;
            Ok(())
        }
        .await;
        drop(temp_file);

        if let Err(e) = copied {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_path, self.blob_path(key)).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(total_bytes)
    }

    async fn get_stream(&self, key: &StorageKey) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.blob_path(key)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &StorageKey) -> Result<bool, StorageError> {
        match fs::remove_file(self.blob_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, key: &StorageKey) -> Result<u64, StorageError> {
        match fs::metadata(self.blob_path(key)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<StorageKey>, StorageError> {
        let mut entries = fs::read_dir(&self.base_path).await?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            // Foreign files that are not valid keys are skipped.
            if let Some(key) = entry
                .file_name()
                .to_str()
                .and_then(|name| StorageKey::parse(name).ok())
            {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}
