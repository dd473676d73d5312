//! Request body extractors that report failures as [`AppError`].

use axum::{
    Json,
    extract::{
        FromRequest, Multipart, Request,
        multipart::{Field, MultipartError},
        rejection::JsonRejection,
    },
    http::{StatusCode, header},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::AppError;
use crate::services::PendingUpload;
use crate::services::attachments::Uploads;
use crate::state::AppState;
use crate::utils::filename::{resolve_content_type, validate_upload_filename};

/// A `Json<T>` wrapper that converts deserialization errors into `AppError::Validation`,
/// ensuring clients always receive structured JSON error responses.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(AppJson(value))
    }
}

/// Map a multipart read failure, keeping body-limit rejections distinct.
pub fn multipart_error(limit: u64) -> impl Fn(MultipartError) -> AppError {
    move |e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge { limit }
        } else {
            AppError::Validation(format!("Multipart error: {}", e.body_text()))
        }
    }
}

/// Stream one multipart file field to a temp file, enforcing `max_size`.
pub async fn spool_field(mut field: Field<'_>, max_size: u64) -> Result<PendingUpload, AppError> {
    let original_name = field
        .file_name()
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
    let original_name = validate_upload_filename(original_name)
        .map_err(|e| AppError::Validation(e.message().into()))?
        .to_string();
    let content_type = resolve_content_type(field.content_type(), &original_name);

    let (file, path) = tempfile::NamedTempFile::new()
        .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error(max_size))? {
        size += chunk.len() as u64;
        if size > max_size {
            return Err(AppError::PayloadTooLarge { limit: max_size });
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
    }
    file.flush()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

    Ok(PendingUpload::new(path, original_name, content_type, size))
}

/// Create/update body for an item: plain JSON, or multipart with a `data`
/// JSON field, an optional `folder` hint and any number of file fields.
pub struct ItemForm {
    pub data: Value,
    pub uploads: Uploads,
}

impl FromRequest<AppState> for ItemForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        let limit = state.config.storage.max_upload_size;

        if !is_multipart {
            let Json(data) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| match e.status() {
                    StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge { limit },
                    _ => AppError::Validation(e.body_text()),
                })?;
            return Ok(Self {
                data,
                uploads: Uploads::default(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let mut data = None;
        let mut uploads = Uploads::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(multipart_error(limit))?
        {
            match field.name() {
                Some("data") => {
                    let text = field.text().await.map_err(multipart_error(limit))?;
                    let value = serde_json::from_str(&text).map_err(|e| {
                        AppError::Validation(format!("Field 'data' is not valid JSON: {e}"))
                    })?;
                    data = Some(value);
                }
                Some("folder") => {
                    let text = field.text().await.map_err(multipart_error(limit))?;
                    let text = text.trim();
                    if !text.is_empty() {
                        uploads.folder_hint = Some(text.to_string());
                    }
                }
                _ if field.file_name().is_some() => {
                    uploads.files.push(spool_field(field, limit).await?);
                }
                _ => {} // Ignore unknown fields.
            }
        }

        Ok(Self {
            data: data.unwrap_or_else(|| Value::Object(Default::default())),
            uploads,
        })
    }
}
