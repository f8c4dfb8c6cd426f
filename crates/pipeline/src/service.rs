//! End-to-end analysis: retrieval, orchestration, quality control, storage.

use std::collections::BTreeMap;
use std::sync::Arc;

use designlens_core::annotation::Annotation;
use designlens_core::error::CoreError;
use designlens_core::model_response::{ImagePayload, ProviderName};
use designlens_core::quality_control::{
    perform_quality_control, recommendations_for_failures, QualityControlOptions,
    QualityControlResult, RagQualityInputs,
};
use designlens_core::store::{AnalysisStore, StoredAnalysis};
use designlens_core::synthesis::SynthesisResult;
use designlens_core::types::AnalysisId;
use serde::{Deserialize, Serialize};

use crate::orchestrator::{OrchestrationOptions, Orchestrator};
use crate::rag::{RagContext, RagLayer, RetrievedPassage};

/// One analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub images: Vec<ImagePayload>,
    pub prompt: String,
    pub options: OrchestrationOptions,
    /// Prepend retrieved guidance to the prompt when a retrieval layer is configured.
    pub use_rag: bool,
    /// Overrides the service's default quality options.
    pub quality_options: Option<QualityControlOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub analysis_id: AnalysisId,
    pub synthesis: SynthesisResult,
    pub quality: QualityControlResult,
    #[serde(default)]
    pub rag_passages: Vec<RetrievedPassage>,
}

pub struct AnalysisService {
    orchestrator: Orchestrator,
    rag: Option<RagLayer>,
    store: Arc<dyn AnalysisStore>,
    quality_options: QualityControlOptions,
}

/// Image references used for grounding checks; falls back to a positional
/// name when the upload carried no URL.
fn image_references(images: &[ImagePayload]) -> Vec<String> {
    images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            if image.source_url.trim().is_empty() {
                format!("image-{i}")
            } else {
                image.source_url.clone()
            }
        })
        .collect()
}

impl AnalysisService {
    pub fn new(
        orchestrator: Orchestrator,
        store: Arc<dyn AnalysisStore>,
        quality_options: QualityControlOptions,
    ) -> Self {
        Self {
            orchestrator,
            rag: None,
            store,
            quality_options,
        }
    }

    pub fn with_rag(mut self, rag: RagLayer) -> Self {
        self.rag = Some(rag);
        self
    }

    /// Run one analysis and persist it.
    ///
    /// Provider failures show up inside the report; only storage errors
    /// are returned as `Err`. `should_retry` is reported, never acted on.
    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisReport, CoreError> {
        let analysis_id = AnalysisId::new_v4();

        let context = match (&self.rag, request.use_rag) {
            (Some(rag), true) => rag.enhance(&request.prompt).await,
            _ => RagContext::empty(),
        };
        let prompt = context.apply(&request.prompt);

        let synthesis = self
            .orchestrator
            .orchestrate(&request.images, &prompt, &request.options)
            .await;

        let options = request
            .quality_options
            .as_ref()
            .unwrap_or(&self.quality_options);
        let mut quality = perform_quality_control(
            &synthesis.final_annotations,
            &image_references(&request.images),
            context.quality.as_ref(),
            options,
        );
        quality
            .recommendations
            .extend(recommendations_for_failures(&synthesis.model_results));

        self.store
            .save_analysis_result(
                analysis_id,
                &synthesis.final_annotations,
                &quality,
                &synthesis.synthesis_metadata,
            )
            .await?;

        tracing::info!(
            analysis_id = %analysis_id,
            annotations = quality.validated_annotations.len(),
            overall_quality = quality.overall_quality,
            should_retry = quality.should_retry,
            "Analysis stored"
        );

        Ok(AnalysisReport {
            analysis_id,
            synthesis,
            quality,
            rag_passages: context.passages,
        })
    }

    pub async fn load(&self, analysis_id: AnalysisId) -> Result<StoredAnalysis, CoreError> {
        self.store.load_analysis_result(analysis_id).await
    }

    /// Quality control over caller-supplied annotations; nothing is stored.
    pub fn quality_control(
        &self,
        annotations: &[Annotation],
        image_urls: &[String],
        rag: Option<&RagQualityInputs>,
        options: Option<&QualityControlOptions>,
    ) -> QualityControlResult {
        perform_quality_control(
            annotations,
            image_urls,
            rag,
            options.unwrap_or(&self.quality_options),
        )
    }

    pub async fn current_weights(&self) -> BTreeMap<ProviderName, f64> {
        self.orchestrator.weights().snapshot().await
    }

    pub async fn store_healthy(&self) -> bool {
        match self.store.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Analysis store health check failed");
                false
            }
        }
    }
}
