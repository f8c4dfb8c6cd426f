//! Persistence seam for finished analyses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::error::CoreError;
use crate::quality_control::QualityControlResult;
use crate::synthesis::SynthesisMetadata;
use crate::types::{AnalysisId, Timestamp};

/// A persisted analysis, as read back from a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnalysis {
    pub analysis_id: AnalysisId,
    pub final_annotations: Vec<Annotation>,
    pub quality_report: QualityControlResult,
    pub synthesis_metadata: SynthesisMetadata,
    pub created_at: Timestamp,
}

/// Storage for analysis results.
///
/// Saving an id that already exists replaces the earlier record.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn save_analysis_result(
        &self,
        analysis_id: AnalysisId,
        final_annotations: &[Annotation],
        quality_report: &QualityControlResult,
        synthesis_metadata: &SynthesisMetadata,
    ) -> Result<(), CoreError>;

    /// Returns [`CoreError::NotFound`] for unknown ids.
    async fn load_analysis_result(&self, analysis_id: AnalysisId)
        -> Result<StoredAnalysis, CoreError>;

    async fn health_check(&self) -> Result<(), CoreError>;
}
