use std::sync::Arc;

use lab_common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub blob_store: Arc<dyn BlobStore>,
}
