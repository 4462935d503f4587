//! Router configuration for the drive UI.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{
    api_upload, blank, browse, change_sort, create_folder, create_folder_redirect, delete_file,
    delete_folder, download, external_use, find, index, list_files, login, login_post,
    login_without_token, logout, move_entry, ppt_to_pdf, rename, upload_files, AppState,
};
use super::middleware::{content_length_limit, security_headers};

/// Create the main router.
///
/// Every route except the landing, login and logout pages requires a
/// session. `max_content_length` bounds request bodies both by declared
/// length (413 before routing) and while streaming.
pub fn create_router(app_state: Arc<AppState>, max_content_length: u64) -> Router {
    // Session routes (no session required)
    let session_routes = Router::new()
        .route("/blank", get(blank))
        .route("/login/", get(login_without_token).post(login_post))
        .route("/login/*token", get(login).post(login_post))
        .route("/logout/", get(logout));

    // Drive routes (session required)
    let drive_routes = Router::new()
        .route("/", get(index))
        .route("/external_use/", get(external_use))
        .route("/changeSort", get(change_sort))
        .route("/files/", get(list_files))
        .route("/files/*path", get(list_files))
        .route("/find/", post(find))
        .route("/find/*path", post(find))
        .route("/move", get(move_entry))
        .route("/rename/*path", get(rename))
        .route("/create/", get(create_folder_redirect).post(create_folder))
        .route("/create/*path", get(create_folder_redirect).post(create_folder))
        .route("/delete/*path", get(delete_file))
        .route("/deleteFolder/", get(delete_folder))
        .route("/deleteFolder/*path", get(delete_folder))
        .route("/browse/*path", get(browse))
        .route("/download/*path", get(download))
        .route("/pptpdf/*path", get(ppt_to_pdf))
        .route("/api/upload/", post(api_upload))
        .route("/api/upload/*path", post(api_upload))
        .route("/upload/", post(upload_files))
        .route("/upload/*path", post(upload_files));

    let body_limit = usize::try_from(max_content_length).unwrap_or(usize::MAX);

    Router::new()
        .merge(session_routes)
        .merge(drive_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(
                    max_content_length,
                    content_length_limit,
                ))
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Create the `/static` router, `None` when the directory is missing.
pub fn create_static_router(static_path: &str) -> Option<Router> {
    if !Path::new(static_path).is_dir() {
        tracing::warn!("Static directory not found: {}", static_path);
        return None;
    }
    Some(Router::new().nest_service("/static", ServeDir::new(static_path)))
}
