use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::state::AppState;
use crate::uploads;
use crate::ws::handler as ws_handler;

/// Simple health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Build the full axum Router: the WebSocket endpoint, the upload endpoints,
/// static serving for uploaded media, and the client assets as fallback.
pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.max_upload_size_mb as usize * 1024 * 1024;

    Router::new()
        .route("/ws", get(ws_handler::ws_upgrade))
        .route("/upload", post(uploads::upload_file))
        .route("/upload-voice", post(uploads::upload_voice))
        .route("/health", get(health_check))
        // multipart framing overhead on top of the file itself
        .layer(DefaultBodyLimit::max(max_body_bytes + 64 * 1024))
        .nest_service("/uploads", ServeDir::new(state.uploads_dir()))
        .fallback_service(ServeDir::new(state.public_dir.clone()))
        .with_state(state)
}
