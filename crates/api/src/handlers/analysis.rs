//! Handlers for running and reading analyses.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use designlens_core::model_response::ImagePayload;
use designlens_core::quality_control::QualityControlOptions;
use designlens_core::types::AnalysisId;
use designlens_pipeline::{AnalysisRequest, OrchestrationOptions};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /api/v1/analyses`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnalysisRequest {
    #[validate(length(min = 1, max = 10, message = "between 1 and 10 images are required"))]
    pub images: Vec<ImagePayload>,
    #[validate(length(min = 1, max = 8000, message = "prompt must be 1-8000 characters"))]
    pub prompt: String,
    #[serde(default)]
    pub options: OrchestrationOptions,
    #[serde(default)]
    pub use_rag: bool,
    #[serde(default)]
    pub quality_options: Option<QualityControlOptions>,
}

/// POST /api/v1/analyses
///
/// Runs the full pipeline. Provider failures are part of the report, so
/// this only fails on invalid input or a storage error.
pub async fn create_analysis(
    State(state): State<AppState>,
    Json(body): Json<CreateAnalysisRequest>,
) -> AppResult<impl IntoResponse> {
    body.validate()?;
    if body.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("prompt must not be blank".into()));
    }

    let request = AnalysisRequest {
        images: body.images,
        prompt: body.prompt,
        options: body.options,
        use_rag: body.use_rag,
        quality_options: body.quality_options,
    };
    let report = state.service.run(request).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: report })))
}

/// GET /api/v1/analyses/{id}
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<AnalysisId>,
) -> AppResult<impl IntoResponse> {
    let stored = state.service.load(id).await?;
    Ok(Json(DataResponse { data: stored }))
}
