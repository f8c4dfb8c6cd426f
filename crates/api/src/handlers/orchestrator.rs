use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/orchestrator/weights
pub async fn get_weights(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let weights = state.service.current_weights().await;
    Ok(Json(DataResponse { data: weights }))
}
