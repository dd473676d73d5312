use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use tracing::instrument;

use crate::content::{SectionName, repository};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::body::AppJson;
use crate::state::AppState;

fn parse_section(name: &str) -> Result<SectionName, AppError> {
    name.parse().map_err(AppError::NotFound)
}

#[utoipa::path(
    get,
    path = "/api/v1/sections/{name}",
    tag = "Sections",
    operation_id = "getSection",
    summary = "Read a whole content section",
    description = "Returns the stored document, or its default shape if nothing was saved yet.",
    params(("name" = String, Path, description = "One of research, team, courses, openings, phd")),
    responses(
        (status = 200, description = "Section document", body = Object),
        (status = 404, description = "Unknown section (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_section(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, AppError> {
    let name = parse_section(&name)?;
    Ok(Json(repository::load_section_json(&state.db, name).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/sections/{name}",
    tag = "Sections",
    operation_id = "replaceSection",
    summary = "Overwrite a whole content section",
    description = "Replaces the stored document. Items without an `id` are assigned one. \
        Last writer wins. Blobs referenced only by the old document are left for the orphan sweep.",
    params(("name" = String, Path, description = "One of research, team, courses, openings, phd")),
    request_body(content = Object, description = "Full section document"),
    responses(
        (status = 200, description = "Stored document", body = Object),
        (status = 400, description = "Body does not match the section shape (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Unknown section (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, body))]
pub async fn replace_section(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
    AppJson(body): AppJson<Value>,
) -> Result<Json<Value>, AppError> {
    let name = parse_section(&name)?;
    Ok(Json(
        repository::replace_section_json(&state.db, name, body).await?,
    ))
}
