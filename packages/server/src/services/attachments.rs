//! Item writes that carry file uploads.
//!
//! Uploads are stored first, then the content document is written. Blobs an
//! item stops referencing are deleted best-effort; failures are logged and
//! left for the orphan sweep.

use lab_common::storage::BlobStore;
use sea_orm::ConnectionTrait;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::blob::{PendingUpload, discard_all, discard_blob, store_blob};
use crate::content::{
    AttachmentSlot, Family, Item, ItemRef, apply_patch,
    repository::{self, find_item, remove_item},
};
use crate::error::AppError;

/// Uploaded files plus the folder hint that came with them.
#[derive(Debug, Default)]
pub struct Uploads {
    pub files: Vec<PendingUpload>,
    /// Overrides the family's default hint when set.
    pub folder_hint: Option<String>,
}

impl Uploads {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn hint<F: Family>(&self) -> Option<&str> {
        self.folder_hint.as_deref().or(F::FOLDER_HINT)
    }
}

fn check_upload_count<F: Family>(uploads: &Uploads) -> Result<(), AppError> {
    let kind = <F::Item as Item>::KIND;
    match <F::Item as Item>::SLOT.max_uploads() {
        Some(0) if !uploads.is_empty() => Err(AppError::Validation(format!(
            "{kind} does not accept file uploads"
        ))),
        Some(max) if uploads.files.len() > max => Err(AppError::Validation(format!(
            "{kind} accepts at most {max} file per request"
        ))),
        _ => Ok(()),
    }
}

/// Store every upload; on the first failure the ones already stored are removed.
async fn store_uploads<F: Family, C: ConnectionTrait>(
    db: &C,
    store: &dyn BlobStore,
    uploads: &Uploads,
) -> Result<Vec<String>, AppError> {
    let hint = uploads.hint::<F>();
    let mut keys = Vec::with_capacity(uploads.files.len());
    for upload in &uploads.files {
        match store_blob(db, store, upload, hint).await {
            Ok(row) => keys.push(row.storage_key),
            Err(e) => {
                discard_all(db, store, &keys).await;
                return Err(e);
            }
        }
    }
    Ok(keys)
}

fn decode_item<T: Item>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body)
        .map_err(|e| AppError::Validation(format!("Invalid {}: {e}", T::KIND)))
}

/// Create an item, storing any uploaded files as its attachments.
#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND, group = ?group, files = uploads.files.len()))]
pub async fn create_item<F: Family, C: ConnectionTrait>(
    db: &C,
    store: &dyn BlobStore,
    group: Option<&str>,
    body: Value,
    uploads: &Uploads,
) -> Result<F::Item, AppError> {
    check_upload_count::<F>(uploads)?;
    let mut item: F::Item = decode_item(body)?;

    // Reject a bad category before anything is uploaded.
    let mut scratch = <F::Section as Default>::default();
    F::items(&mut scratch, group, true)?;

    let keys = store_uploads::<F, _>(db, store, uploads).await?;
    if !keys.is_empty() {
        item.set_attachments(keys.clone());
    }

    match repository::add_item::<F, _>(db, group, item).await {
        Ok(item) => Ok(item),
        Err(e) => {
            discard_all(db, store, &keys).await;
            Err(e)
        }
    }
}

/// Apply a partial update. New uploads replace every existing attachment;
/// without uploads the existing attachments are kept.
#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND, group = ?group, item = %item_ref, files = uploads.files.len()))]
pub async fn update_item<F: Family, C: ConnectionTrait>(
    db: &C,
    store: &dyn BlobStore,
    group: Option<&str>,
    item_ref: ItemRef,
    patch: &Value,
    uploads: &Uploads,
) -> Result<F::Item, AppError> {
    check_upload_count::<F>(uploads)?;
    let current = find_item::<F, _>(db, group, item_ref).await?;

    let old_keys = current.attachments();
    let mut next = apply_patch(&current, patch)?;
    next.set_attachments(old_keys.clone());
    next.validate()?;

    let new_keys = store_uploads::<F, _>(db, store, uploads).await?;
    let replaced = if new_keys.is_empty() {
        Vec::new()
    } else {
        next.set_attachments(new_keys.clone());
        old_keys
    };

    if !replaced.is_empty() {
        info!(count = replaced.len(), "Deleting replaced attachments");
        discard_all(db, store, &replaced).await;
    }

    let id = current.id();
    let written = repository::update_item::<F, _, _>(db, group, ItemRef::Id(id), move |item| {
        *item = next;
        Ok(())
    })
    .await;

    if let Err(e) = &written
        && !new_keys.is_empty()
    {
        warn!(keys = ?new_keys, error = ?e, "Content write failed after upload; blobs left for sweep");
    }
    written
}

/// Remove an item and, best-effort, every blob it references.
///
/// The record goes first: if it cannot be removed, its blobs stay intact.
#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND, group = ?group, item = %item_ref))]
pub async fn delete_item<F: Family, C: ConnectionTrait>(
    db: &C,
    store: &dyn BlobStore,
    group: Option<&str>,
    item_ref: ItemRef,
) -> Result<F::Item, AppError> {
    let removed = remove_item::<F, _>(db, group, item_ref).await?;
    discard_all(db, store, &removed.attachments()).await;
    Ok(removed)
}

/// Drop one attachment from an item and delete its blob.
#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND, group = ?group, item = %item_ref, key = %key))]
pub async fn detach_attachment<F: Family, C: ConnectionTrait>(
    db: &C,
    store: &dyn BlobStore,
    group: Option<&str>,
    item_ref: ItemRef,
    key: &str,
) -> Result<F::Item, AppError> {
    let kind = <F::Item as Item>::KIND;
    let current = find_item::<F, _>(db, group, item_ref).await?;

    let mut remaining = current.attachments();
    let before = remaining.len();
    remaining.retain(|k| k != key);
    if remaining.len() == before {
        return Err(AppError::NotFound(format!(
            "{kind} does not reference file '{key}'"
        )));
    }
    if <F::Item as Item>::SLOT == AttachmentSlot::Required && remaining.is_empty() {
        return Err(AppError::Validation(format!(
            "{kind} requires a file; upload a replacement instead"
        )));
    }

    discard_blob(db, store, key).await;

    repository::update_item::<F, _, _>(db, group, ItemRef::Id(current.id()), move |item| {
        let mut keys = item.attachments();
        keys.retain(|k| k != key);
        item.set_attachments(keys);
        Ok(())
    })
    .await
}
