pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::topic_map::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/topic-maps", post(handlers::handle_create))
        .route(
            "/api/v1/topic-maps/:session_id",
            get(handlers::handle_get).delete(handlers::handle_delete),
        )
        .route(
            "/api/v1/topic-maps/:session_id/generate",
            post(handlers::handle_regenerate),
        )
        .route(
            "/api/v1/topic-maps/:session_id/stats",
            get(handlers::handle_stats),
        )
        .route(
            "/api/v1/topic-maps/:session_id/hierarchy",
            get(handlers::handle_hierarchy),
        )
        .route(
            "/api/v1/topic-maps/:session_id/export",
            get(handlers::handle_export),
        )
        .route(
            "/api/v1/topic-maps/:session_id/import",
            post(handlers::handle_import),
        )
        .route(
            "/api/v1/topic-maps/:session_id/upload",
            post(handlers::handle_upload),
        )
        .with_state(state)
}
