//! Blob metadata rows paired with bytes in the [`BlobStore`].
//!
//! The metadata row is written before the bytes and removed after them, so
//! bytes never exist without a row except after a crash mid-upload.

use chrono::Utc;
use lab_common::storage::{BlobFolder, BlobStore, BoxReader, StorageKey};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tempfile::TempPath;
use tracing::{debug, instrument, warn};

use crate::entity::blob;
use crate::error::AppError;

/// An uploaded file spooled to local disk, waiting to be stored.
///
/// The temp file is removed when this value is dropped.
#[derive(Debug)]
pub struct PendingUpload {
    path: TempPath,
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
}

impl PendingUpload {
    pub fn new(path: TempPath, original_name: String, content_type: String, size: u64) -> Self {
        Self {
            path,
            original_name,
            content_type,
            size,
        }
    }

    async fn open(&self) -> Result<BoxReader, AppError> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        Ok(Box::new(file))
    }
}

/// Store one upload under a fresh key and record its metadata.
#[instrument(skip_all, fields(name = %upload.original_name, size = upload.size))]
pub async fn store_blob<C: ConnectionTrait>(
    db: &C,
    store: &dyn BlobStore,
    upload: &PendingUpload,
    hint: Option<&str>,
) -> Result<blob::Model, AppError> {
    let key = StorageKey::generate(&upload.original_name);
    let folder = BlobFolder::classify(&upload.content_type, hint);

    let row = blob::ActiveModel {
        storage_key: Set(key.as_str().to_owned()),
        original_name: Set(upload.original_name.clone()),
        content_type: Set(upload.content_type.clone()),
        folder: Set(folder.as_str().to_owned()),
        size: Set(i64::try_from(upload.size).unwrap_or(i64::MAX)),
        uploaded_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    let reader = upload.open().await?;
    if let Err(e) = store.put_stream(&key, reader).await {
        if let Err(cleanup) = blob::Entity::delete_by_id(key.as_str().to_owned())
            .exec(db)
            .await
        {
            warn!(key = %key, error = %cleanup, "Failed to remove metadata after write error");
        }
        return Err(e.into());
    }

    debug!(key = %key, folder = %folder, "Stored blob");
    Ok(row)
}

/// A blob ready to stream: its metadata row, byte length and reader.
pub struct FetchedBlob {
    pub row: blob::Model,
    /// Length of the stored bytes, which is what the reader yields.
    pub size: u64,
    pub reader: BoxReader,
}

/// Metadata plus a byte stream for one key.
pub async fn fetch_blob<C: ConnectionTrait>(
    db: &C,
    store: &dyn BlobStore,
    key: &StorageKey,
) -> Result<FetchedBlob, AppError> {
    let row = blob::Entity::find_by_id(key.as_str().to_owned())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File '{key}' not found")))?;
    let size = store.size(key).await?;
    if i64::try_from(size).ok() != Some(row.size) {
        warn!(key = %key, recorded = row.size, stored = size, "Blob size differs from metadata");
    }
    let reader = store.get_stream(key).await?;
    Ok(FetchedBlob { row, size, reader })
}

/// Newest first, optionally restricted to one folder.
pub async fn list_blobs<C: ConnectionTrait>(
    db: &C,
    folder: Option<BlobFolder>,
) -> Result<Vec<blob::Model>, AppError> {
    let mut query = blob::Entity::find();
    if let Some(folder) = folder {
        query = query.filter(blob::Column::Folder.eq(folder.as_str()));
    }
    Ok(query
        .order_by_desc(blob::Column::UploadedAt)
        .order_by_desc(blob::Column::StorageKey)
        .all(db)
        .await?)
}

/// Remove bytes and metadata. Fails with `NotFound` when neither exists.
#[instrument(skip(db, store), fields(key = %key))]
pub async fn delete_blob<C: ConnectionTrait>(
    db: &C,
    store: &dyn BlobStore,
    key: &StorageKey,
) -> Result<(), AppError> {
    let row = blob::Entity::find_by_id(key.as_str().to_owned())
        .one(db)
        .await?;
    let had_bytes = store.delete(key).await?;

    match (row, had_bytes) {
        (None, false) => Err(AppError::NotFound(format!("File '{key}' not found"))),
        (Some(_), had_bytes) => {
            if !had_bytes {
                warn!("Metadata existed without bytes");
            }
            blob::Entity::delete_by_id(key.as_str().to_owned())
                .exec(db)
                .await?;
            Ok(())
        }
        (None, true) => {
            debug!("Removed bytes that had no metadata");
            Ok(())
        }
    }
}

/// Delete a referenced blob without failing the caller.
pub async fn discard_blob<C: ConnectionTrait>(db: &C, store: &dyn BlobStore, key: &str) {
    let key = match StorageKey::parse(key) {
        Ok(key) => key,
        Err(e) => {
            warn!(key, error = %e, "Skipping delete of malformed storage key");
            return;
        }
    };
    match delete_blob(db, store, &key).await {
        Ok(()) => {}
        Err(AppError::NotFound(_)) => debug!(key = %key, "Blob already gone"),
        Err(e) => warn!(key = %key, error = ?e, "Failed to delete blob"),
    }
}

/// [`discard_blob`] for every key, concurrently.
pub async fn discard_all<C: ConnectionTrait>(db: &C, store: &dyn BlobStore, keys: &[String]) {
    futures::future::join_all(keys.iter().map(|key| discard_blob(db, store, key))).await;
}

