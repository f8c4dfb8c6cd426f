//! Stand-alone quality control over caller-supplied annotations.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use designlens_core::annotation::Annotation;
use designlens_core::quality_control::{QualityControlOptions, RagQualityInputs};
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /api/v1/quality-control`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QualityControlRequest {
    #[validate(length(max = 200, message = "at most 200 annotations per request"))]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub rag: Option<RagQualityInputs>,
    #[serde(default)]
    pub options: Option<QualityControlOptions>,
}

fn check_unit_interval(name: &str, value: f64) -> AppResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("{name} must be within [0, 1], got {value}")))
    }
}

/// POST /api/v1/quality-control
///
/// Nothing is persisted.
pub async fn run_quality_control(
    State(state): State<AppState>,
    Json(body): Json<QualityControlRequest>,
) -> AppResult<impl IntoResponse> {
    body.validate()?;
    if let Some(rag) = &body.rag {
        check_unit_interval("rag.ragQualityScore", rag.rag_quality_score)?;
        check_unit_interval("rag.hallucinationRisk", rag.hallucination_risk)?;
    }
    if let Some(options) = &body.options {
        check_unit_interval(
            "options.minimumQualityThreshold",
            options.minimum_quality_threshold,
        )?;
    }

    let result = state.service.quality_control(
        &body.annotations,
        &body.image_urls,
        body.rag.as_ref(),
        body.options.as_ref(),
    );
    tracing::debug!(
        annotations = body.annotations.len(),
        validated = result.validated_annotations.len(),
        overall_quality = result.overall_quality,
        "Quality control request served"
    );

    Ok(Json(DataResponse { data: result }))
}
