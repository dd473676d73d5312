//! Per-item handlers, generic over the content family.
//!
//! Ungrouped families are mounted at `/{family}`, grouped ones at
//! `/{family}/{category}`. `{item}` is an item id or a legacy list index.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use crate::content::{Family, Item, ItemRef};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::extractors::body::ItemForm;
use crate::services::attachments;
use crate::state::AppState;

async fn create<F: Family>(
    state: &AppState,
    group: Option<&str>,
    form: ItemForm,
) -> Result<(StatusCode, Json<F::Item>), AppError> {
    let item = attachments::create_item::<F, _>(
        &state.db,
        &*state.blob_store,
        group,
        form.data,
        &form.uploads,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update<F: Family>(
    state: &AppState,
    group: Option<&str>,
    item: &str,
    form: ItemForm,
) -> Result<Json<F::Item>, AppError> {
    let item_ref: ItemRef = item.parse()?;
    let item = attachments::update_item::<F, _>(
        &state.db,
        &*state.blob_store,
        group,
        item_ref,
        &form.data,
        &form.uploads,
    )
    .await?;
    Ok(Json(item))
}

async fn delete<F: Family>(
    state: &AppState,
    group: Option<&str>,
    item: &str,
) -> Result<StatusCode, AppError> {
    let item_ref: ItemRef = item.parse()?;
    attachments::delete_item::<F, _>(&state.db, &*state.blob_store, group, item_ref).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn detach<F: Family>(
    state: &AppState,
    group: Option<&str>,
    item: &str,
    key: &str,
) -> Result<Json<F::Item>, AppError> {
    let item_ref: ItemRef = item.parse()?;
    let item =
        attachments::detach_attachment::<F, _>(&state.db, &*state.blob_store, group, item_ref, key)
            .await?;
    Ok(Json(item))
}

#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND))]
pub async fn create_item<F: Family>(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    form: ItemForm,
) -> Result<(StatusCode, Json<F::Item>), AppError> {
    create::<F>(&state, None, form).await
}

#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND, %item))]
pub async fn update_item<F: Family>(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(item): Path<String>,
    form: ItemForm,
) -> Result<Json<F::Item>, AppError> {
    update::<F>(&state, None, &item, form).await
}

#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND, %item))]
pub async fn delete_item<F: Family>(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(item): Path<String>,
) -> Result<StatusCode, AppError> {
    delete::<F>(&state, None, &item).await
}

#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND, %item, %key))]
pub async fn detach_attachment<F: Family>(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path((item, key)): Path<(String, String)>,
) -> Result<Json<F::Item>, AppError> {
    detach::<F>(&state, None, &item, &key).await
}

#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND, %category))]
pub async fn create_grouped_item<F: Family>(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(category): Path<String>,
    form: ItemForm,
) -> Result<(StatusCode, Json<F::Item>), AppError> {
    create::<F>(&state, Some(&category), form).await
}

#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND, %category, %item))]
pub async fn update_grouped_item<F: Family>(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path((category, item)): Path<(String, String)>,
    form: ItemForm,
) -> Result<Json<F::Item>, AppError> {
    update::<F>(&state, Some(&category), &item, form).await
}

#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND, %category, %item))]
pub async fn delete_grouped_item<F: Family>(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path((category, item)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    delete::<F>(&state, Some(&category), &item).await
}

#[instrument(skip_all, fields(kind = <F::Item as Item>::KIND, %category, %item, %key))]
pub async fn detach_grouped_attachment<F: Family>(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path((category, item, key)): Path<(String, String, String)>,
) -> Result<Json<F::Item>, AppError> {
    detach::<F>(&state, Some(&category), &item, &key).await
}
