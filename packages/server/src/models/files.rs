use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::blob;

/// Metadata for one stored file.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    /// Server-generated key used to reference and download the file.
    #[schema(example = "1700000000000-call.pdf")]
    pub storage_key: String,
    #[schema(example = "Call 2025.pdf")]
    pub original_name: String,
    #[schema(example = "application/pdf")]
    pub content_type: String,
    /// One of `pdfs`, `images/publications`, `images/team`.
    #[schema(example = "pdfs")]
    pub folder: String,
    #[schema(example = 142857)]
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<blob::Model> for FileResponse {
    fn from(model: blob::Model) -> Self {
        Self {
            storage_key: model.storage_key,
            original_name: model.original_name,
            content_type: model.content_type,
            folder: model.folder,
            size: model.size,
            uploaded_at: model.uploaded_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct FileListQuery {
    /// Only list files in this folder.
    #[param(example = "images/team")]
    pub folder: Option<String>,
}
