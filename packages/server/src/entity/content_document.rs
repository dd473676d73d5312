use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One whole-document content section (research, team, courses, openings, phd).
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_document")]
pub struct Model {
    /// Logical section name.
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,

    /// Shape version of `body`; 0 is the legacy id-less layout.
    pub schema_version: i32,

    #[sea_orm(column_type = "JsonBinary")]
    pub body: serde_json::Value,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
