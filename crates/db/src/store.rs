//! PostgreSQL-backed [`AnalysisStore`].

use async_trait::async_trait;
use designlens_core::annotation::Annotation;
use designlens_core::error::CoreError;
use designlens_core::quality_control::QualityControlResult;
use designlens_core::store::{AnalysisStore, StoredAnalysis};
use designlens_core::synthesis::SynthesisMetadata;
use designlens_core::types::AnalysisId;

use crate::models::analysis_result::CreateAnalysisResult;
use crate::repositories::AnalysisResultRepo;
use crate::DbPool;

#[derive(Clone)]
pub struct PgAnalysisStore {
    pool: DbPool,
}

impl PgAnalysisStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn storage_error(e: sqlx::Error) -> CoreError {
    CoreError::Storage(e.to_string())
}

#[async_trait]
impl AnalysisStore for PgAnalysisStore {
    async fn save_analysis_result(
        &self,
        analysis_id: AnalysisId,
        final_annotations: &[Annotation],
        quality_report: &QualityControlResult,
        synthesis_metadata: &SynthesisMetadata,
    ) -> Result<(), CoreError> {
        let body = CreateAnalysisResult {
            id: analysis_id,
            final_annotations,
            quality_report,
            synthesis_metadata,
        };
        AnalysisResultRepo::upsert(&self.pool, &body)
            .await
            .map_err(storage_error)?;
        tracing::debug!(analysis_id = %analysis_id, "Analysis result persisted");
        Ok(())
    }

    async fn load_analysis_result(
        &self,
        analysis_id: AnalysisId,
    ) -> Result<StoredAnalysis, CoreError> {
        AnalysisResultRepo::find_by_id(&self.pool, analysis_id)
            .await
            .map_err(storage_error)?
            .map(StoredAnalysis::from)
            .ok_or(CoreError::NotFound {
                entity: "AnalysisResult",
                id: analysis_id,
            })
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool).await.map_err(storage_error)
    }
}
