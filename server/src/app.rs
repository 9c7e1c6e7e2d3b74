use axum::Router;
use axum::routing::{get, post, put};
use tower_http::compression::CompressionLayer;

use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::api::health))
        .route("/api/metrics", get(routes::api::metrics))
        .route("/api/regions", get(routes::api::get_regions))
        .route("/api/regions/{id}", get(routes::api::get_region))
        .route("/api/frame", get(routes::api::get_frame))
        .route("/api/hit", get(routes::api::hit_test))
        .route("/api/pointer", post(routes::api::post_pointer))
        .route("/api/selection", post(routes::api::post_selection))
        .route("/api/view", put(routes::api::put_view))
        .layer(CompressionLayer::new())
        .with_state(state)
}
