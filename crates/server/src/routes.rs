use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{handlers, AppState};

/// Request bodies larger than this are rejected before deserialization.
const BODY_LIMIT: usize = 1024 * 1024;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/receive-data", post(handlers::receive_data))
        .route("/download-latest", get(handlers::download_latest))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
