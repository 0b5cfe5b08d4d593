//! Route table and the handlers behind it.

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    response::IntoResponse,
    routing::{get, MethodRouter},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{error::ApiError, state::AppState};

pub mod messages;
pub mod topic_messages;
pub mod topics;

/// Largest accepted request body. Message text has no length cap of its
/// own, so this only guards memory.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Builds the full application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", json_405(get(health)))
        .route("/topics", json_405(get(topics::list).post(topics::create)))
        .route(
            "/topics/:id",
            json_405(
                get(topics::retrieve)
                    .put(topics::replace)
                    .patch(topics::partial_update)
                    .delete(topics::destroy),
            ),
        )
        .route("/messages", json_405(get(messages::list).post(messages::create)))
        .route(
            "/messages/:id",
            json_405(
                get(messages::retrieve)
                    .put(messages::replace)
                    .patch(messages::partial_update)
                    .delete(messages::destroy),
            ),
        )
        .route(
            "/topics/:topic_id/messages",
            json_405(get(topic_messages::list).post(topic_messages::create)),
        )
        .route(
            "/topics/:topic_id/messages/:msg_id",
            json_405(
                get(topic_messages::retrieve)
                    .put(topic_messages::replace)
                    .patch(topic_messages::partial_update)
                    .delete(topic_messages::destroy),
            ),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Answers methods a route doesn't serve with a JSON 405.
fn json_405(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(method_not_allowed)
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}
