pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /analyses                 run an analysis (POST)
/// /analyses/{id}            stored analysis result (GET)
/// /quality-control          quality control over supplied annotations (POST)
/// /orchestrator/weights     current adaptive weight table (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/analyses", post(handlers::analysis::create_analysis))
        .route("/analyses/{id}", get(handlers::analysis::get_analysis))
        .route(
            "/quality-control",
            post(handlers::quality_control::run_quality_control),
        )
        .route(
            "/orchestrator/weights",
            get(handlers::orchestrator::get_weights),
        )
}
