use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::config::AppConfig;
use crate::content::{
    Collaborations, Courses, Family, Openings, PhdScholars, Publications, TeamMembers,
};
use crate::handlers::{self, files::upload_body_limit, items};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> Router<AppState> {
    let limit = config.storage.max_upload_size;
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/sections", section_routes())
        .nest("/publications", item_routes::<Publications>(limit))
        .nest("/collaborations", item_routes::<Collaborations>(limit))
        .nest("/courses", item_routes::<Courses>(limit))
        .nest("/phd-scholars", item_routes::<PhdScholars>(limit))
        .nest("/team", grouped_item_routes::<TeamMembers>(limit))
        .nest("/openings", grouped_item_routes::<Openings>(limit))
        .nest("/files", file_routes(limit))
        .nest("/admin", admin_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(handlers::auth::login))
}

fn section_routes() -> Router<AppState> {
    Router::new().route(
        "/{name}",
        get(handlers::sections::get_section).put(handlers::sections::replace_section),
    )
}

fn item_routes<F: Family>(limit: u64) -> Router<AppState> {
    Router::new()
        .route("/", post(items::create_item::<F>))
        .route(
            "/{item}",
            patch(items::update_item::<F>).delete(items::delete_item::<F>),
        )
        .route(
            "/{item}/attachments/{key}",
            delete(items::detach_attachment::<F>),
        )
        .layer(upload_body_limit(limit))
}

fn grouped_item_routes<F: Family>(limit: u64) -> Router<AppState> {
    Router::new()
        .route("/{category}", post(items::create_grouped_item::<F>))
        .route(
            "/{category}/{item}",
            patch(items::update_grouped_item::<F>).delete(items::delete_grouped_item::<F>),
        )
        .route(
            "/{category}/{item}/attachments/{key}",
            delete(items::detach_grouped_attachment::<F>),
        )
        .layer(upload_body_limit(limit))
}

fn file_routes(limit: u64) -> Router<AppState> {
    let upload = Router::new()
        .route(
            "/",
            get(handlers::files::list_files).post(handlers::files::upload_file),
        )
        .layer(upload_body_limit(limit));

    let by_key = Router::new().route(
        "/{key}",
        get(handlers::files::download_file).delete(handlers::files::delete_file),
    );

    upload.merge(by_key)
}

fn admin_routes() -> Router<AppState> {
    Router::new().route("/sweep", post(handlers::admin::sweep))
}
