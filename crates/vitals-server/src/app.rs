use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::decompression::RequestDecompressionLayer;

use crate::api;
use crate::logging;
use crate::state::AppState;

/// Builds the HTTP app. Request bodies are transparently un-gzipped when
/// the agent marks them `Content-Encoding: gzip`; responses are gzipped
/// when the client accepts it.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(api::index))
        .route("/ping", get(api::ping))
        .route("/value/{kind}/{name}", get(api::value_path))
        .route("/value", post(api::value_body))
        .route("/value/", post(api::value_body))
        .route("/update/{kind}/{name}/{value}", post(api::update_path))
        .route("/update", post(api::update_body))
        .route("/update/", post(api::update_body))
        .route("/updates", post(api::updates_body))
        .route("/updates/", post(api::updates_body))
        .with_state(state)
        .layer(middleware::from_fn(logging::request_logging))
        .layer(RequestDecompressionLayer::new())
        .layer(CompressionLayer::new())
        .layer(cors)
}
