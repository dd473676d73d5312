use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Name of the single dashboard account.
    pub admin_username: String,
    /// Argon2 PHC string for the dashboard account.
    pub admin_password_hash: String,
}

/// Blob storage settings.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding blob bytes. Default: "./data/blobs".
    #[serde(default = "default_blob_dir")]
    pub blob_dir: PathBuf,
    /// Per-request upload cap in bytes. Default: 10 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    /// Unreferenced blobs younger than this are left alone by the sweep. Default: 3600.
    #[serde(default = "default_orphan_grace_secs")]
    pub orphan_grace_secs: u64,
}

fn default_blob_dir() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024
}
fn default_orphan_grace_secs() -> u64 {
    3600
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            blob_dir: default_blob_dir(),
            max_upload_size: default_max_upload_size(),
            orphan_grace_secs: default_orphan_grace_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("LAB_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600_i64)?
            .set_default("auth.admin_username", "admin")?
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., LAB__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("LAB").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
