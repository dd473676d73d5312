use std::str::FromStr;

use axum::Json;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use lab_common::storage::{BlobFolder, StorageKey};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::body::{multipart_error, spool_field};
use crate::models::files::{FileListQuery, FileResponse};
use crate::services::blob;
use crate::state::AppState;
use crate::utils::filename::content_disposition_value;

/// Room for multipart boundaries, part headers and the `data`/`folder` fields.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Body cap for routes that accept uploads. Each file is checked against
/// `max_upload_size` on its own while it is spooled.
pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_upload_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(MULTIPART_OVERHEAD))
}

#[utoipa::path(
    post,
    path = "/api/v1/files",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a standalone file",
    description = "Stores one file and returns its metadata. The `file` multipart field is required; \
        an optional `folder` field is the classification hint (`team` routes images to `images/team`). \
        Non-image files are always filed under `pdfs`.",
    request_body(content_type = "multipart/form-data", description = "File upload with optional folder hint"),
    responses(
        (status = 201, description = "File stored", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, multipart))]
pub async fn upload_file(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let limit = state.config.storage.max_upload_size;
    let mut upload = None;
    let mut folder_hint: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error(limit))?
    {
        match field.name() {
            Some("file") => {
                if upload.is_some() {
                    return Err(AppError::Validation(
                        "Only one 'file' field is allowed".into(),
                    ));
                }
                upload = Some(spool_field(field, limit).await?);
            }
            Some("folder") => {
                let text = field.text().await.map_err(multipart_error(limit))?;
                folder_hint = Some(text.trim().to_string()).filter(|t| !t.is_empty());
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let upload = upload.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let row = blob::store_blob(
        &state.db,
        &*state.blob_store,
        &upload,
        folder_hint.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(FileResponse::from(row))))
}

#[utoipa::path(
    get,
    path = "/api/v1/files",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List stored files",
    description = "Newest first. Optionally filtered by folder.",
    params(FileListQuery),
    responses(
        (status = 200, description = "File metadata", body = Vec<FileResponse>),
        (status = 400, description = "Unknown folder (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_files(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<FileListQuery>,
) -> Result<Json<Vec<FileResponse>>, AppError> {
    let folder = query
        .folder
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(BlobFolder::from_str)
        .transpose()
        .map_err(AppError::Validation)?;

    let files = blob::list_blobs(&state.db, folder)
        .await?
        .into_iter()
        .map(FileResponse::from)
        .collect();

    Ok(Json(files))
}

#[utoipa::path(
    get,
    path = "/api/v1/files/{key}",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download a file",
    description = "Streams the file with its original content type. Supports ETag-based caching via If-None-Match.",
    params(("key" = String, Path, description = "Storage key")),
    responses(
        (status = 200, description = "File content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn download_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let key = StorageKey::parse(&key)?;
    let blob::FetchedBlob { row, size, reader } =
        blob::fetch_blob(&state.db, &*state.blob_store, &key).await?;

    let etag_value = format!("\"{}\"", row.storage_key);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let body = Body::from_stream(ReaderStream::new(reader));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &row.content_type)
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&row.original_name),
        )
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}

#[utoipa::path(
    delete,
    path = "/api/v1/files/{key}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Removes the bytes and metadata. Deleting a key that does not exist is an error, \
        not a no-op. Content records that still reference the key are not modified.",
    params(("key" = String, Path, description = "Storage key")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn delete_file(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    let key = StorageKey::parse(&key)?;
    blob::delete_blob(&state.db, &*state.blob_store, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}
