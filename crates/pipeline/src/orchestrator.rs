//! Multi-model orchestration over one analysis request.
//!
//! The primary provider is called first; its acceptance decides the role of
//! the secondary call. Secondary and research-validation calls run
//! concurrently. Provider failures never escape: the worst outcome is an
//! empty [`SynthesisResult`] with zero confidence.

use std::sync::Arc;

use designlens_core::annotation::Annotation;
use designlens_core::model_response::{ImagePayload, ModelResponse};
use designlens_core::scoring::score_annotation_quality;
use designlens_core::synthesis::{
    apply_research_findings, contributing_weights, is_primary_acceptable, is_secondary_acceptable,
    merge_annotations, recomputed_confidence, OrchestrationState, SecondaryRole, SynthesisMetadata,
    SynthesisResult, FALLBACK_PRIMARY_INSUFFICIENT, FALLBACK_RESEARCH_FAILED,
    FALLBACK_SECONDARY_FAILED, FALLBACK_SECONDARY_INSUFFICIENT, FALLBACK_SYNTHESIS_DISCOUNT,
    MAX_MERGED_ANNOTATIONS, PRIMARY_SYNTHESIS_DISCOUNT,
};
use designlens_providers::{call, CallConfig, VisionProvider};
use serde::{Deserialize, Serialize};

use crate::weights::WeightTable;

/// Reported as `primary_model_used` when no provider produced annotations.
pub const NO_MODEL_USED: &str = "none";

/// Per-request switches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestrationOptions {
    /// Skip secondary and research calls when the primary is accepted.
    pub force_primary_only: bool,
    pub enable_research_validation: bool,
}

/// Long-lived orchestrator settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Nudge the shared weight table after every run.
    pub adaptive_weights: bool,
    pub primary_call: CallConfig,
    pub secondary_call: CallConfig,
    pub research_call: CallConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            adaptive_weights: true,
            primary_call: CallConfig::default(),
            secondary_call: CallConfig::default(),
            research_call: CallConfig::default(),
        }
    }
}

fn flag_disabled(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no")
}

impl OrchestratorConfig {
    /// Defaults, with `ORCHESTRATOR_ADAPTIVE_WEIGHTS=false` disabling adaptation.
    pub fn from_env() -> Self {
        let adaptive_weights = std::env::var("ORCHESTRATOR_ADAPTIVE_WEIGHTS")
            .map(|v| !flag_disabled(&v))
            .unwrap_or(true);
        Self {
            adaptive_weights,
            ..Self::default()
        }
    }
}

pub struct Orchestrator {
    primary: Arc<dyn VisionProvider>,
    secondary: Arc<dyn VisionProvider>,
    research: Option<Arc<dyn VisionProvider>>,
    weights: Arc<WeightTable>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        primary: Arc<dyn VisionProvider>,
        secondary: Arc<dyn VisionProvider>,
        weights: Arc<WeightTable>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            primary,
            secondary,
            research: None,
            weights,
            config,
        }
    }

    /// Attach the research-validation provider.
    pub fn with_research(mut self, research: Arc<dyn VisionProvider>) -> Self {
        self.research = Some(research);
        self
    }

    pub fn weights(&self) -> &Arc<WeightTable> {
        &self.weights
    }

    /// Run one analysis request through the provider state machine.
    pub async fn orchestrate(
        &self,
        images: &[ImagePayload],
        prompt: &str,
        options: &OrchestrationOptions,
    ) -> SynthesisResult {
        let mut states = vec![OrchestrationState::Init];
        let mut fallbacks: Vec<String> = Vec::new();

        let primary = call(
            self.primary.as_ref(),
            images,
            prompt,
            &self.config.primary_call,
        )
        .await;
        states.push(OrchestrationState::PrimaryCalled);

        let primary_accepted = is_primary_acceptable(&primary);
        if primary_accepted {
            states.push(OrchestrationState::PrimaryAccepted);
        } else {
            states.push(OrchestrationState::PrimaryRejected);
            fallbacks.push(FALLBACK_PRIMARY_INSUFFICIENT.to_string());
            tracing::warn!(
                provider = %primary.provider_name,
                success = primary.success,
                annotations = primary.annotation_count(),
                "Primary result rejected, falling back"
            );
        }

        let role = if primary_accepted {
            SecondaryRole::Supplementary
        } else {
            SecondaryRole::PrimaryFallback
        };

        let (secondary, research) = if primary_accepted && options.force_primary_only {
            (None, None)
        } else {
            let secondary_call = call(
                self.secondary.as_ref(),
                images,
                prompt,
                &self.config.secondary_call,
            );
            let research_call = async {
                match &self.research {
                    Some(provider) if options.enable_research_validation => {
                        let config = &self.config.research_call;
                        Some(call(provider.as_ref(), images, prompt, config).await)
                    }
                    _ => None,
                }
            };
            let (secondary, research) = tokio::join!(secondary_call, research_call);
            (Some(secondary), research)
        };

        if let Some(secondary) = &secondary {
            states.push(OrchestrationState::SecondaryCalled);
            if !secondary.success {
                fallbacks.push(FALLBACK_SECONDARY_FAILED.to_string());
            } else if !is_secondary_acceptable(secondary, role) {
                fallbacks.push(FALLBACK_SECONDARY_INSUFFICIENT.to_string());
            }
        }
        if let Some(research) = &research {
            states.push(OrchestrationState::ResearchCalled);
            if !research.success {
                fallbacks.push(FALLBACK_RESEARCH_FAILED.to_string());
            }
        }

        let (mut final_annotations, confidence_score, primary_model_used) =
            synthesize(&primary, primary_accepted, secondary.as_ref(), role);

        if let Some(findings) = research.as_ref().and_then(|r| r.research.as_ref()) {
            apply_research_findings(&mut final_annotations, findings);
        }

        let mut model_results = vec![primary];
        model_results.extend(secondary);
        model_results.extend(research);

        if final_annotations.is_empty() {
            fallbacks.extend(model_results.iter().map(|r| r.provider_name.to_string()));
        }

        let weights = contributing_weights(&self.weights.snapshot().await, &model_results);
        let quality_score = score_annotation_quality(&final_annotations);
        states.push(OrchestrationState::Synthesized);

        if self.config.adaptive_weights {
            self.weights.adjust(&model_results).await;
        }
        states.push(OrchestrationState::Done);

        tracing::info!(
            primary_model_used = %primary_model_used,
            annotations = final_annotations.len(),
            confidence_score,
            quality_score,
            fallbacks = ?fallbacks,
            "Orchestration complete"
        );

        SynthesisResult {
            final_annotations,
            model_results,
            synthesis_metadata: SynthesisMetadata {
                primary_model_used,
                weights,
                confidence_score,
                fallbacks_triggered: fallbacks,
                quality_score,
                states_visited: states,
            },
        }
    }
}

fn capped(annotations: &[Annotation]) -> Vec<Annotation> {
    annotations
        .iter()
        .take(MAX_MERGED_ANNOTATIONS)
        .cloned()
        .collect()
}

fn fallback_base(response: &ModelResponse) -> (Vec<Annotation>, f64, String) {
    (
        capped(&response.annotations),
        recomputed_confidence(response) * FALLBACK_SYNTHESIS_DISCOUNT,
        response.provider_name.to_string(),
    )
}

/// Pick the synthesis base and its discounted confidence.
///
/// With the primary rejected, a secondary that meets its fallback bar
/// becomes the base. When it does not, the larger of the two unaccepted
/// lists wins, ties going to the higher recomputed confidence and then
/// to the secondary.
fn synthesize(
    primary: &ModelResponse,
    primary_accepted: bool,
    secondary: Option<&ModelResponse>,
    role: SecondaryRole,
) -> (Vec<Annotation>, f64, String) {
    if primary_accepted {
        let supplementary = secondary
            .filter(|s| is_secondary_acceptable(s, role))
            .map(|s| s.annotations.as_slice())
            .unwrap_or_default();
        return (
            merge_annotations(&primary.annotations, supplementary),
            recomputed_confidence(primary) * PRIMARY_SYNTHESIS_DISCOUNT,
            primary.provider_name.to_string(),
        );
    }

    if let Some(secondary) = secondary.filter(|s| is_secondary_acceptable(s, role)) {
        return fallback_base(secondary);
    }

    let usable = |r: &&ModelResponse| r.success && !r.annotations.is_empty();
    let rank = |r: &ModelResponse| (r.annotation_count(), recomputed_confidence(r));
    let best = match (secondary.filter(usable), Some(primary).filter(usable)) {
        (Some(s), Some(p)) if rank(p) > rank(s) => Some(p),
        (Some(s), _) => Some(s),
        (None, p) => p,
    };

    match best {
        Some(response) => fallback_base(response),
        None => (Vec::new(), 0.0, NO_MODEL_USED.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use designlens_core::annotation::Severity;
    use designlens_core::model_response::{ErrorCategory, ProviderName, ResearchFindings};
    use designlens_providers::{ProviderError, ProviderOutput};

    use super::*;

    /// Returns a fixed outcome without touching the network.
    struct Scripted {
        name: ProviderName,
        outcome: Outcome,
    }

    #[derive(Clone)]
    enum Outcome {
        Annotations {
            count: usize,
            confidence: f64,
            offset: f64,
        },
        Research(&'static str, usize),
        Fails(&'static str),
        Hangs,
    }

    fn annotations(count: usize, confidence: f64, offset: f64) -> Outcome {
        Outcome::Annotations {
            count,
            confidence,
            offset,
        }
    }

    #[async_trait]
    impl VisionProvider for Scripted {
        fn name(&self) -> ProviderName {
            self.name
        }

        fn default_timeout(&self) -> Duration {
            Duration::from_millis(50)
        }

        async fn invoke(
            &self,
            _images: &[ImagePayload],
            _prompt: &str,
            _config: &CallConfig,
        ) -> Result<ProviderOutput, ProviderError> {
            match self.outcome.clone() {
                Outcome::Annotations {
                    count,
                    confidence,
                    offset,
                } => Ok(ProviderOutput {
                    annotations: grid(self.name, count, offset),
                    confidence,
                    research: None,
                }),
                Outcome::Research(summary, sources) => Ok(ProviderOutput {
                    annotations: Vec::new(),
                    confidence: 0.8,
                    research: Some(ResearchFindings {
                        summary: summary.to_string(),
                        citations: (0..sources)
                            .map(|i| format!("https://source/{i}"))
                            .collect(),
                    }),
                }),
                Outcome::Fails(message) => Err(ProviderError::InvalidRequest(message.to_string())),
                Outcome::Hangs => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(ProviderOutput::default())
                }
            }
        }
    }

    const CATEGORIES: [&str; 5] = ["layout", "accessibility", "typography", "color", "navigation"];

    /// `count` annotations on a 5-wide grid with 20-unit spacing.
    fn grid(provider: ProviderName, count: usize, offset: f64) -> Vec<Annotation> {
        (0..count)
            .map(|i| {
                Annotation::new(
                    format!("{provider}-{}", i + 1),
                    0,
                    2.0 + (i % 5) as f64 * 20.0 + offset,
                    2.0 + (i / 5) as f64 * 20.0 + offset,
                    Severity::Important,
                    CATEGORIES[i % 5],
                    "The element at this position deviates from the spacing grid used on the page",
                )
            })
            .collect()
    }

    fn provider(name: ProviderName, outcome: Outcome) -> Arc<dyn VisionProvider> {
        Arc::new(Scripted { name, outcome })
    }

    fn images() -> Vec<ImagePayload> {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;
        let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
        bytes.resize(300, 1);
        vec![ImagePayload {
            encoded_payload: STANDARD.encode(bytes),
            mime_type: "image/png".into(),
            source_url: "https://cdn.example.com/a.png".into(),
        }]
    }

    fn fixed_weights() -> OrchestratorConfig {
        OrchestratorConfig {
            adaptive_weights: false,
            ..Default::default()
        }
    }

    fn orchestrator(primary: Outcome, secondary: Outcome) -> Orchestrator {
        Orchestrator::new(
            provider(ProviderName::Claude, primary),
            provider(ProviderName::Openai, secondary),
            Arc::new(WeightTable::default()),
            fixed_weights(),
        )
    }

    fn with_research() -> OrchestrationOptions {
        OrchestrationOptions {
            enable_research_validation: true,
            ..Default::default()
        }
    }

    fn primary_only() -> OrchestrationOptions {
        OrchestrationOptions {
            force_primary_only: true,
            ..Default::default()
        }
    }

    async fn run(orch: &Orchestrator, options: &OrchestrationOptions) -> SynthesisResult {
        orch.orchestrate(&images(), "audit", options).await
    }

    fn weight_sum(result: &SynthesisResult) -> f64 {
        result.synthesis_metadata.weights.values().sum()
    }

    #[tokio::test]
    async fn accepted_primary_with_covered_secondary() {
        // Secondary sits 1 unit off every primary slot, so nothing is added.
        let orch = orchestrator(annotations(18, 0.9, 0.0), annotations(10, 0.9, 1.0));
        let result = run(&orch, &OrchestrationOptions::default()).await;
        let meta = &result.synthesis_metadata;

        assert_eq!(result.final_annotations.len(), 18);
        assert!(meta.fallbacks_triggered.is_empty());
        assert!((meta.confidence_score - 0.855).abs() < 1e-9);
        assert_eq!(meta.primary_model_used, "claude");
        assert!((weight_sum(&result) - 1.0).abs() < 1e-6);
        assert_eq!(meta.states_visited.last(), Some(&OrchestrationState::Done));
    }

    #[tokio::test]
    async fn primary_only_short_circuits() {
        let orch = orchestrator(
            annotations(18, 0.9, 0.0),
            Outcome::Fails("must not be called"),
        );
        let result = run(&orch, &primary_only()).await;
        let meta = &result.synthesis_metadata;

        assert_eq!(result.model_results.len(), 1);
        assert!(meta.fallbacks_triggered.is_empty());
        assert_eq!(
            meta.states_visited,
            vec![
                OrchestrationState::Init,
                OrchestrationState::PrimaryCalled,
                OrchestrationState::PrimaryAccepted,
                OrchestrationState::Synthesized,
                OrchestrationState::Done,
            ]
        );
        assert_eq!(meta.weights.get(&ProviderName::Claude), Some(&1.0));
    }

    #[tokio::test]
    async fn primary_only_still_falls_back_when_primary_is_rejected() {
        let orch = orchestrator(Outcome::Fails("boom"), annotations(14, 0.8, 0.0));
        let result = run(&orch, &primary_only()).await;
        let meta = &result.synthesis_metadata;

        assert_eq!(result.model_results.len(), 2);
        assert!(meta
            .states_visited
            .contains(&OrchestrationState::SecondaryCalled));
        assert_eq!(result.final_annotations.len(), 14);
        assert_eq!(meta.primary_model_used, "openai");
        assert_eq!(
            meta.fallbacks_triggered,
            vec![FALLBACK_PRIMARY_INSUFFICIENT.to_string()]
        );
    }

    #[tokio::test]
    async fn primary_timeout_falls_back_to_secondary() {
        let orch = orchestrator(Outcome::Hangs, annotations(14, 0.8, 0.0));
        let result = run(&orch, &OrchestrationOptions::default()).await;
        let meta = &result.synthesis_metadata;

        assert_eq!(
            result.model_results[0].error_category,
            Some(ErrorCategory::Timeout)
        );
        assert_eq!(
            meta.fallbacks_triggered,
            vec![FALLBACK_PRIMARY_INSUFFICIENT.to_string()]
        );
        assert_eq!(result.final_annotations.len(), 14);
        assert!(result
            .final_annotations
            .iter()
            .all(|a| a.id.starts_with("openai-")));
        assert!((meta.confidence_score - 0.56).abs() < 1e-9);
        assert_eq!(meta.primary_model_used, "openai");
        assert_eq!(
            meta.weights.keys().collect::<Vec<_>>(),
            vec![&ProviderName::Openai]
        );
    }

    #[tokio::test]
    async fn research_timeout_leaves_concurrent_secondary_intact() {
        let orch = orchestrator(Outcome::Fails("boom"), annotations(14, 0.8, 0.0))
            .with_research(provider(ProviderName::Perplexity, Outcome::Hangs));

        let started = Instant::now();
        let result = run(&orch, &with_research()).await;
        let meta = &result.synthesis_metadata;

        // The hung call is cut at its 50 ms limit, not awaited for 5 s.
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(result.model_results.len(), 3);
        assert!(result.model_results[1].success);
        assert_eq!(
            result.model_results[2].error_category,
            Some(ErrorCategory::Timeout)
        );
        assert_eq!(result.final_annotations.len(), 14);
        assert!(result
            .final_annotations
            .iter()
            .all(|a| a.id.starts_with("openai-")));
        assert!(meta
            .fallbacks_triggered
            .iter()
            .any(|f| f == FALLBACK_RESEARCH_FAILED));
        assert!((meta.confidence_score - 0.56).abs() < 1e-9);
    }

    #[tokio::test]
    async fn total_failure_yields_empty_done_result() {
        let orch = orchestrator(Outcome::Fails("boom"), Outcome::Fails("boom"))
            .with_research(provider(ProviderName::Perplexity, Outcome::Fails("boom")));
        let result = run(&orch, &with_research()).await;
        let meta = &result.synthesis_metadata;

        assert!(result.final_annotations.is_empty());
        assert_eq!(meta.confidence_score, 0.0);
        assert_eq!(meta.quality_score, 0.0);
        assert!(meta.weights.is_empty());
        assert_eq!(meta.primary_model_used, NO_MODEL_USED);
        let expected = [
            "claude",
            "openai",
            "perplexity",
            FALLBACK_SECONDARY_FAILED,
            FALLBACK_RESEARCH_FAILED,
        ];
        for name in expected {
            assert!(
                meta.fallbacks_triggered.iter().any(|f| f == name),
                "missing {name}"
            );
        }
        assert_eq!(meta.states_visited.last(), Some(&OrchestrationState::Done));
    }

    #[tokio::test]
    async fn merge_never_exceeds_cap() {
        // Secondary is offset far enough that every slot is uncovered.
        let orch = orchestrator(annotations(16, 0.95, 0.0), annotations(12, 0.9, 11.0));
        let result = run(&orch, &OrchestrationOptions::default()).await;

        assert_eq!(result.final_annotations.len(), MAX_MERGED_ANNOTATIONS);
        assert!(result.final_annotations[..16]
            .iter()
            .all(|a| a.id.starts_with("claude-")));
    }

    #[tokio::test]
    async fn weak_secondary_is_not_merged() {
        let orch = orchestrator(annotations(12, 0.9, 0.0), annotations(5, 0.9, 11.0));
        let result = run(&orch, &OrchestrationOptions::default()).await;
        let meta = &result.synthesis_metadata;

        assert_eq!(result.final_annotations.len(), 12);
        assert_eq!(
            meta.fallbacks_triggered,
            vec![FALLBACK_SECONDARY_INSUFFICIENT.to_string()]
        );
        assert!((meta.confidence_score - 0.8 * 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn rejected_primary_is_used_when_secondary_has_nothing() {
        let orch = orchestrator(annotations(7, 0.9, 0.0), Outcome::Fails("down"));
        let result = run(&orch, &OrchestrationOptions::default()).await;
        let meta = &result.synthesis_metadata;

        assert_eq!(result.final_annotations.len(), 7);
        assert!((meta.confidence_score - 0.5 * 0.7).abs() < 1e-9);
        assert_eq!(
            meta.fallbacks_triggered,
            vec![
                FALLBACK_PRIMARY_INSUFFICIENT.to_string(),
                FALLBACK_SECONDARY_FAILED.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn larger_rejected_primary_beats_insufficient_fallback() {
        let orch = orchestrator(annotations(11, 0.9, 0.0), annotations(3, 0.9, 0.0));
        let result = run(&orch, &OrchestrationOptions::default()).await;
        let meta = &result.synthesis_metadata;

        assert_eq!(result.final_annotations.len(), 11);
        assert!(result
            .final_annotations
            .iter()
            .all(|a| a.id.starts_with("claude-")));
        assert_eq!(meta.primary_model_used, "claude");
        assert!((meta.confidence_score - 0.5 * 0.7).abs() < 1e-9);
        assert_eq!(
            meta.fallbacks_triggered,
            vec![
                FALLBACK_PRIMARY_INSUFFICIENT.to_string(),
                FALLBACK_SECONDARY_INSUFFICIENT.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn larger_insufficient_secondary_beats_smaller_rejected_primary() {
        let orch = orchestrator(annotations(4, 0.9, 0.0), annotations(9, 0.9, 0.0));
        let result = run(&orch, &OrchestrationOptions::default()).await;

        assert_eq!(result.final_annotations.len(), 9);
        assert_eq!(result.synthesis_metadata.primary_model_used, "openai");
    }

    #[tokio::test]
    async fn research_annotates_without_adding() {
        let research = Outcome::Research("Accessibility guidance: keep 4.5:1 contrast.", 3);
        let orch = orchestrator(annotations(12, 0.9, 0.0), annotations(8, 0.9, 1.0))
            .with_research(provider(ProviderName::Perplexity, research));
        let result = run(&orch, &with_research()).await;

        assert_eq!(result.final_annotations.len(), 12);
        assert!(result
            .final_annotations
            .iter()
            .all(|a| a.research_sources == Some(3)));
        let by_category = |category: &str| {
            result
                .final_annotations
                .iter()
                .find(|a| a.category == category)
                .unwrap()
                .research_validated
        };
        assert_eq!(by_category("accessibility"), Some(true));
        assert_eq!(by_category("layout"), Some(false));

        let weights = &result.synthesis_metadata.weights;
        assert_eq!(weights.len(), 3);
        assert!((weight_sum(&result) - 1.0).abs() < 1e-6);
        assert!((weights[&ProviderName::Claude] - 0.70).abs() < 1e-9);
        assert!(result
            .synthesis_metadata
            .states_visited
            .contains(&OrchestrationState::ResearchCalled));
    }

    #[tokio::test]
    async fn adaptive_weights_move_after_a_run() {
        let table = Arc::new(WeightTable::default());
        let orch = Orchestrator::new(
            provider(ProviderName::Claude, Outcome::Fails("boom")),
            provider(ProviderName::Openai, annotations(14, 0.8, 0.0)),
            Arc::clone(&table),
            OrchestratorConfig::default(),
        );
        run(&orch, &OrchestrationOptions::default()).await;

        let weights = table.snapshot().await;
        assert!(weights[&ProviderName::Claude] < 0.70);
        assert!(weights[&ProviderName::Openai] > 0.20);
    }
}
