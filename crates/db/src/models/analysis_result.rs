//! Analysis result models and DTOs.
//!
//! Maps to the `analysis_results` table. Annotation lists and reports are
//! stored as JSONB documents in their camelCase wire form.

use designlens_core::annotation::Annotation;
use designlens_core::quality_control::QualityControlResult;
use designlens_core::store::StoredAnalysis;
use designlens_core::synthesis::SynthesisMetadata;
use designlens_core::types::{AnalysisId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `analysis_results` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnalysisResultRow {
    pub id: AnalysisId,
    pub final_annotations: Json<Vec<Annotation>>,
    pub quality_report: Json<QualityControlResult>,
    pub synthesis_metadata: Json<SynthesisMetadata>,
    pub primary_model_used: String,
    pub confidence_score: f64,
    pub overall_quality: f64,
    pub should_retry: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<AnalysisResultRow> for StoredAnalysis {
    fn from(row: AnalysisResultRow) -> Self {
        Self {
            analysis_id: row.id,
            final_annotations: row.final_annotations.0,
            quality_report: row.quality_report.0,
            synthesis_metadata: row.synthesis_metadata.0,
            created_at: row.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// DTO for inserting (or replacing) an analysis result.
#[derive(Debug)]
pub struct CreateAnalysisResult<'a> {
    pub id: AnalysisId,
    pub final_annotations: &'a [Annotation],
    pub quality_report: &'a QualityControlResult,
    pub synthesis_metadata: &'a SynthesisMetadata,
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Lightweight listing entry without the JSONB documents.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnalysisResultSummary {
    pub id: AnalysisId,
    pub primary_model_used: String,
    pub confidence_score: f64,
    pub overall_quality: f64,
    pub should_retry: bool,
    pub created_at: Timestamp,
}
