//! Reconciliation between content references and stored blobs.

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use lab_common::storage::{BlobStore, StorageKey};
use sea_orm::{ConnectionTrait, EntityTrait};
use tracing::{info, instrument, warn};

use super::blob::delete_blob;
use crate::content::repository::referenced_keys;
use crate::entity::blob;
use crate::error::AppError;
use crate::models::admin::SweepReport;

/// Find blobs no section references and, unless `dry_run`, delete them.
///
/// Blobs uploaded within `grace` are skipped: they may belong to a request
/// that has stored its files but not yet written the content record. Bytes
/// without a metadata row are always eligible.
#[instrument(skip(db, store))]
pub async fn sweep_orphans<C: ConnectionTrait>(
    db: &C,
    store: &dyn BlobStore,
    grace: Duration,
    dry_run: bool,
) -> Result<SweepReport, AppError> {
    let referenced = referenced_keys(db).await?;
    let rows = blob::Entity::find().all(db).await?;
    let stored = store.keys().await?;

    let cutoff = TimeDelta::from_std(grace)
        .ok()
        .and_then(|grace| Utc::now().checked_sub_signed(grace))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let known: HashSet<&str> = rows.iter().map(|row| row.storage_key.as_str()).collect();

    let mut orphaned: BTreeSet<String> = rows
        .iter()
        .filter(|row| !referenced.contains(&row.storage_key) && row.uploaded_at < cutoff)
        .map(|row| row.storage_key.clone())
        .collect();
    orphaned.extend(
        stored
            .iter()
            .map(StorageKey::as_str)
            .filter(|key| !known.contains(key) && !referenced.contains(*key))
            .map(str::to_owned),
    );

    let stored_set: HashSet<&str> = stored.iter().map(StorageKey::as_str).collect();
    let mut dangling: Vec<String> = referenced
        .iter()
        .filter(|key| !known.contains(key.as_str()) && !stored_set.contains(key.as_str()))
        .cloned()
        .collect();
    dangling.sort();

    let mut deleted = Vec::new();
    if !dry_run {
        for key in &orphaned {
            let parsed = match StorageKey::parse(key) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(key, error = %e, "Skipping orphan with malformed key");
                    continue;
                }
            };
            match delete_blob(db, store, &parsed).await {
                Ok(()) | Err(AppError::NotFound(_)) => deleted.push(key.clone()),
                Err(e) => warn!(key, error = ?e, "Failed to delete orphaned blob"),
            }
        }
    }

    let scanned = known
        .iter()
        .copied()
        .chain(stored_set.iter().copied())
        .collect::<HashSet<_>>()
        .len();

    info!(
        scanned,
        orphaned = orphaned.len(),
        deleted = deleted.len(),
        dangling = dangling.len(),
        "Orphan sweep finished"
    );

    Ok(SweepReport {
        scanned,
        referenced: referenced.len(),
        orphaned: orphaned.into_iter().collect(),
        deleted,
        dangling,
    })
}
