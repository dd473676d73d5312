use std::time::Duration;

use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::admin::{SweepQuery, SweepReport};
use crate::services::sweep::sweep_orphans;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/admin/sweep",
    tag = "Admin",
    operation_id = "sweepOrphans",
    summary = "Reconcile stored files with content references",
    description = "Reports files no content section references and, unless `dry_run` is set, deletes \
        those older than the configured grace period. Referenced keys with no stored file are \
        reported as dangling and left in place.",
    params(SweepQuery),
    responses(
        (status = 200, description = "Sweep report", body = SweepReport),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn sweep(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SweepQuery>,
) -> Result<Json<SweepReport>, AppError> {
    let grace = Duration::from_secs(state.config.storage.orphan_grace_secs);
    let report = sweep_orphans(&state.db, &*state.blob_store, grace, query.dry_run).await?;
    Ok(Json(report))
}
