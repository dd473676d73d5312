use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Metadata for one stored blob. Bytes live in the blob store under the same key.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blob")]
pub struct Model {
    /// Server-generated storage key, e.g. `1700000000000-call.pdf`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub storage_key: String,

    /// Filename as supplied by the uploader.
    pub original_name: String,

    pub content_type: String,

    /// Folder tag: `pdfs`, `images/publications` or `images/team`.
    #[sea_orm(indexed)]
    pub folder: String,

    pub size: i64,

    #[sea_orm(indexed)]
    pub uploaded_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
