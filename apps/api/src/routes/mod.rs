pub mod health;
pub mod ui;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::chat::handlers;
use crate::state::AppState;

/// Resume uploads larger than this are rejected before extraction.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::index_handler))
        .route("/health", get(health::health_handler))
        // Chat API
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/messages",
            post(handlers::handle_send_message),
        )
        .route("/api/v1/sessions/:id/retry", post(handlers::handle_retry))
        .route(
            "/api/v1/sessions/:id/resume",
            post(handlers::handle_upload_resume).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/v1/sessions/:id/reset",
            post(handlers::handle_reset_session),
        )
        .with_state(state)
}
