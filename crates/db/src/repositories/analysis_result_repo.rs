//! Repository for the `analysis_results` table.

use designlens_core::types::AnalysisId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::analysis_result::{
    AnalysisResultRow, AnalysisResultSummary, CreateAnalysisResult,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, final_annotations, quality_report, synthesis_metadata, \
    primary_model_used, confidence_score, overall_quality, should_retry, created_at, updated_at";

/// Provides CRUD operations for analysis results.
pub struct AnalysisResultRepo;

impl AnalysisResultRepo {
    /// Insert an analysis result, replacing any earlier row with the same id.
    pub async fn upsert(
        pool: &PgPool,
        body: &CreateAnalysisResult<'_>,
    ) -> Result<AnalysisResultRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO analysis_results
                (id, final_annotations, quality_report, synthesis_metadata,
                 primary_model_used, confidence_score, overall_quality, should_retry)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (id) DO UPDATE SET
                final_annotations = EXCLUDED.final_annotations,
                quality_report = EXCLUDED.quality_report,
                synthesis_metadata = EXCLUDED.synthesis_metadata,
                primary_model_used = EXCLUDED.primary_model_used,
                confidence_score = EXCLUDED.confidence_score,
                overall_quality = EXCLUDED.overall_quality,
                should_retry = EXCLUDED.should_retry,
                updated_at = now()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnalysisResultRow>(&query)
            .bind(body.id)
            .bind(Json(body.final_annotations))
            .bind(Json(body.quality_report))
            .bind(Json(body.synthesis_metadata))
            .bind(&body.synthesis_metadata.primary_model_used)
            .bind(body.synthesis_metadata.confidence_score)
            .bind(body.quality_report.overall_quality)
            .bind(body.quality_report.should_retry)
            .fetch_one(pool)
            .await
    }

    /// Find an analysis result by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: AnalysisId,
    ) -> Result<Option<AnalysisResultRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM analysis_results WHERE id = $1");
        sqlx::query_as::<_, AnalysisResultRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Most recent analyses first.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<AnalysisResultSummary>, sqlx::Error> {
        sqlx::query_as::<_, AnalysisResultSummary>(
            "SELECT id, primary_model_used, confidence_score, overall_quality, should_retry,
                    created_at
             FROM analysis_results
             ORDER BY created_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Delete an analysis result. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: AnalysisId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM analysis_results WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
