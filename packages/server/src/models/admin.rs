use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SweepQuery {
    /// Report without deleting anything.
    #[serde(default)]
    pub dry_run: bool,
}

/// Outcome of an orphan-blob sweep.
#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
pub struct SweepReport {
    /// Blobs examined.
    pub scanned: usize,
    /// Distinct storage keys referenced by content.
    pub referenced: usize,
    /// Unreferenced blobs older than the grace period.
    pub orphaned: Vec<String>,
    /// Orphans actually removed; empty on a dry run.
    pub deleted: Vec<String>,
    /// Referenced keys with no stored blob.
    pub dangling: Vec<String>,
}
