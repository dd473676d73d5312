use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use lab_common::storage::filesystem::FilesystemBlobStore;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use lab_server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig,
};
use lab_server::state::AppState;
use lab_server::utils::hash::hash_password;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery";

/// Argon2 hashing is slow enough to be worth doing once per test binary.
fn admin_password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(ADMIN_PASSWORD).expect("Failed to hash admin password"))
}

pub mod routes {
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const PUBLICATIONS: &str = "/api/v1/publications";
    pub const COLLABORATIONS: &str = "/api/v1/collaborations";
    pub const COURSES: &str = "/api/v1/courses";
    pub const PHD_SCHOLARS: &str = "/api/v1/phd-scholars";
    pub const FILES: &str = "/api/v1/files";
    pub const SWEEP: &str = "/api/v1/admin/sweep";

    fn encode(segment: &str) -> String {
        segment.replace(' ', "%20")
    }

    pub fn section(name: &str) -> String {
        format!("/api/v1/sections/{name}")
    }

    pub fn publication(item: &str) -> String {
        format!("{PUBLICATIONS}/{item}")
    }

    pub fn publication_attachment(item: &str, key: &str) -> String {
        format!("{PUBLICATIONS}/{item}/attachments/{key}")
    }

    pub fn collaboration(item: &str) -> String {
        format!("{COLLABORATIONS}/{item}")
    }

    pub fn course(item: &str) -> String {
        format!("{COURSES}/{item}")
    }

    pub fn phd_scholar(item: &str) -> String {
        format!("{PHD_SCHOLARS}/{item}")
    }

    pub fn phd_scholar_attachment(item: &str, key: &str) -> String {
        format!("{PHD_SCHOLARS}/{item}/attachments/{key}")
    }

    pub fn team(category: &str) -> String {
        format!("/api/v1/team/{}", encode(category))
    }

    pub fn team_member(category: &str, item: &str) -> String {
        format!("{}/{item}", team(category))
    }

    pub fn team_member_attachment(category: &str, item: &str, key: &str) -> String {
        format!("{}/{item}/attachments/{key}", team(category))
    }

    pub fn openings(category: &str) -> String {
        format!("/api/v1/openings/{}", encode(category))
    }

    pub fn opening(category: &str, item: &str) -> String {
        format!("{}/{item}", openings(category))
    }

    pub fn opening_attachment(category: &str, item: &str, key: &str) -> String {
        format!("{}/{item}/attachments/{key}", openings(category))
    }

    pub fn file(key: &str) -> String {
        format!("{FILES}/{key}")
    }
}

/// A running test server backed by a throwaway SQLite file and blob directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub blob_dir: PathBuf,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// One file part for a multipart request.
pub struct Upload<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub mime: &'a str,
    pub bytes: Vec<u8>,
}

impl<'a> Upload<'a> {
    pub fn new(file_name: &'a str, mime: &'a str, bytes: &[u8]) -> Self {
        Self {
            field: "file",
            file_name,
            mime,
            bytes: bytes.to_vec(),
        }
    }

    fn into_part(self) -> Part {
        Part::bytes(self.bytes)
            .file_name(self.file_name.to_string())
            .mime_str(self.mime)
            .expect("Failed to set MIME type")
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn with a tweak applied to the config before the server starts.
    pub async fn spawn_with(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("lab.db").display());
        let blob_dir = dir.path().join("blobs");

        let mut app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url.clone(),
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                admin_username: ADMIN_USERNAME.to_string(),
                admin_password_hash: admin_password_hash().to_string(),
            },
            storage: StorageConfig {
                blob_dir: blob_dir.clone(),
                ..Default::default()
            },
        };
        configure(&mut app_config);

        let db = lab_server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");

        let blob_store = FilesystemBlobStore::new(
            app_config.storage.blob_dir.clone(),
            app_config.storage.max_upload_size,
        )
        .await
        .expect("Failed to create blob store");

        let state = AppState {
            db: db.clone(),
            config: app_config,
            blob_store: Arc::new(blob_store),
        };

        let app = lab_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            blob_dir,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn login(&self) -> String {
        let res = self
            .post_without_token(
                routes::LOGIN,
                &serde_json::json!({
                    "username": ADMIN_USERNAME,
                    "password": ADMIN_PASSWORD,
                }),
            )
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string()
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn put_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Send an item body as multipart: `data` JSON plus file parts.
    pub async fn send_item_form(
        &self,
        method: reqwest::Method,
        path: &str,
        data: Option<&Value>,
        uploads: Vec<Upload<'_>>,
        token: &str,
    ) -> TestResponse {
        let mut form = Form::new();
        if let Some(data) = data {
            form = form.text("data", data.to_string());
        }
        for upload in uploads {
            let field = upload.field.to_string();
            form = form.part(field, upload.into_part());
        }

        let res = self
            .client
            .request(method, self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    /// Upload a standalone file through `/files`.
    pub async fn upload_file(
        &self,
        upload: Upload<'_>,
        folder: Option<&str>,
        token: &str,
    ) -> TestResponse {
        let mut form = Form::new().part("file", upload.into_part());
        if let Some(folder) = folder {
            form = form.text("folder", folder.to_string());
        }

        let res = self
            .client
            .post(self.url(routes::FILES))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Download raw bytes; returns `(status, content type, bytes)`.
    pub async fn download(&self, key: &str) -> (u16, Option<String>, Vec<u8>) {
        let res = self
            .client
            .get(self.url(&routes::file(key)))
            .send()
            .await
            .expect("Failed to send download request");
        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = res.bytes().await.expect("Failed to read body").to_vec();
        (status, content_type, bytes)
    }

    pub async fn file_exists(&self, key: &str) -> bool {
        let (status, _, _) = self.download(key).await;
        status == 200
    }

    pub async fn section(&self, name: &str) -> Value {
        let res = self.get_without_token(&routes::section(name)).await;
        assert_eq!(res.status, 200, "get section failed: {}", res.text);
        res.body
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> String {
        self.body["id"]
            .as_str()
            .expect("response body should contain 'id'")
            .to_string()
    }

    pub fn storage_key(&self) -> String {
        self.body["storageKey"]
            .as_str()
            .expect("response body should contain 'storageKey'")
            .to_string()
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}
