//! Multi-model synthesis policy: acceptance rules, merge, and weights.
//!
//! The async orchestrator in `designlens-pipeline` drives the provider
//! calls; everything that decides what to do with their responses lives
//! here so the policy is reproducible given a fixed set of responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::model_response::{ModelResponse, ProviderName, ResearchFindings};
use crate::scoring::{confidence_for_count, ACCEPTABLE_MIN};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Hard cap on synthesized annotations.
pub const MAX_MERGED_ANNOTATIONS: usize = 19;

/// A candidate is covered when an existing annotation is within this many
/// units on both axes.
pub const COVERAGE_RADIUS: f64 = 10.0;

/// Minimum count for a supplementary secondary result to be merged.
pub const SUPPLEMENTARY_MIN: usize = 8;

/// Discount applied to an accepted primary result.
pub const PRIMARY_SYNTHESIS_DISCOUNT: f64 = 0.9;

/// Discount applied when synthesis falls back to a non-primary base.
pub const FALLBACK_SYNTHESIS_DISCOUNT: f64 = 0.7;

pub const DEFAULT_PRIMARY_WEIGHT: f64 = 0.70;
pub const DEFAULT_SECONDARY_WEIGHT: f64 = 0.20;
pub const DEFAULT_RESEARCH_WEIGHT: f64 = 0.10;

pub const FALLBACK_PRIMARY_INSUFFICIENT: &str = "claude-quality-insufficient";
pub const FALLBACK_SECONDARY_FAILED: &str = "openai-failed";
pub const FALLBACK_SECONDARY_INSUFFICIENT: &str = "openai-quality-insufficient";
pub const FALLBACK_RESEARCH_FAILED: &str = "perplexity-failed";

// ---------------------------------------------------------------------------
// Orchestration state machine
// ---------------------------------------------------------------------------

/// States one orchestration run passes through. `Done` is always reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationState {
    Init,
    PrimaryCalled,
    PrimaryAccepted,
    PrimaryRejected,
    SecondaryCalled,
    ResearchCalled,
    Synthesized,
    Done,
}

/// How the secondary provider's output is going to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryRole {
    /// Primary succeeded; secondary only fills uncovered slots.
    Supplementary,
    /// Primary failed or was rejected; secondary becomes the base.
    PrimaryFallback,
}

impl SecondaryRole {
    pub fn minimum_annotations(&self) -> usize {
        match self {
            Self::Supplementary => SUPPLEMENTARY_MIN,
            Self::PrimaryFallback => ACCEPTABLE_MIN,
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisMetadata {
    pub primary_model_used: String,
    /// Provider weights over providers that succeeded; sums to 1.0 or is empty.
    pub weights: BTreeMap<ProviderName, f64>,
    pub confidence_score: f64,
    pub fallbacks_triggered: Vec<String>,
    pub quality_score: f64,
    #[serde(default)]
    pub states_visited: Vec<OrchestrationState>,
}

/// The orchestrator's output for one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisResult {
    pub final_annotations: Vec<Annotation>,
    pub model_results: Vec<ModelResponse>,
    pub synthesis_metadata: SynthesisMetadata,
}

// ---------------------------------------------------------------------------
// Acceptance
// ---------------------------------------------------------------------------

/// Whether the primary provider's response can serve as the synthesis base.
///
/// Below [`ACCEPTABLE_MIN`] annotations a response is rejected no matter
/// what confidence the provider reported.
pub fn is_primary_acceptable(response: &ModelResponse) -> bool {
    response.success && response.annotation_count() >= ACCEPTABLE_MIN
}

/// Whether a secondary response meets the threshold for its role.
pub fn is_secondary_acceptable(response: &ModelResponse, role: SecondaryRole) -> bool {
    response.success && response.annotation_count() >= role.minimum_annotations()
}

/// Count-derived confidence for a response (`0.0` for failures).
pub fn recomputed_confidence(response: &ModelResponse) -> f64 {
    if !response.success {
        return 0.0;
    }
    confidence_for_count(response.annotation_count(), response.confidence)
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

fn is_covered(candidate: &Annotation, existing: &[Annotation]) -> bool {
    existing.iter().any(|a| {
        a.image_index == candidate.image_index
            && (a.x - candidate.x).abs() <= COVERAGE_RADIUS
            && (a.y - candidate.y).abs() <= COVERAGE_RADIUS
    })
}

/// Merge supplementary annotations into a primary base.
///
/// The base is kept in order (truncated to the cap); supplementary
/// annotations are appended only for uncovered positions until the
/// merged set reaches [`MAX_MERGED_ANNOTATIONS`]. Ids colliding with an
/// existing id get a `-supplement` suffix, numbered until unique.
pub fn merge_annotations(base: &[Annotation], supplementary: &[Annotation]) -> Vec<Annotation> {
    let mut merged: Vec<Annotation> = base
        .iter()
        .take(MAX_MERGED_ANNOTATIONS)
        .cloned()
        .collect();

    for candidate in supplementary {
        if merged.len() >= MAX_MERGED_ANNOTATIONS {
            break;
        }
        if is_covered(candidate, &merged) {
            continue;
        }
        let mut added = candidate.clone();
        if merged.iter().any(|a| a.id == added.id) {
            added.id = unique_supplement_id(&merged, &added.id);
        }
        merged.push(added);
    }

    merged
}

/// `{id}-supplement`, numbered from 2 when that is taken as well.
fn unique_supplement_id(merged: &[Annotation], id: &str) -> String {
    let taken = |candidate: &str| merged.iter().any(|a| a.id == candidate);
    let mut next = format!("{id}-supplement");
    let mut n = 2;
    while taken(next.as_str()) {
        next = format!("{id}-supplement-{n}");
        n += 1;
    }
    next
}

/// Attach research-validation metadata to synthesized annotations.
///
/// Research never adds annotations. Every annotation gets the source
/// count; it is marked validated when the research summary mentions its
/// category.
pub fn apply_research_findings(annotations: &mut [Annotation], findings: &ResearchFindings) {
    let summary = findings.summary.to_lowercase();
    let sources = u32::try_from(findings.citations.len()).unwrap_or(u32::MAX);
    for annotation in annotations.iter_mut() {
        let category = annotation.category.trim().to_lowercase();
        annotation.research_sources = Some(sources);
        annotation.research_validated = Some(!category.is_empty() && summary.contains(&category));
    }
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Initial priority weights: primary, secondary, research-validation.
pub fn default_weights() -> BTreeMap<ProviderName, f64> {
    BTreeMap::from([
        (ProviderName::Claude, DEFAULT_PRIMARY_WEIGHT),
        (ProviderName::Openai, DEFAULT_SECONDARY_WEIGHT),
        (ProviderName::Perplexity, DEFAULT_RESEARCH_WEIGHT),
    ])
}

/// Restrict `base` to providers whose response succeeded and renormalize
/// to sum 1.0. Returns an empty map when nothing succeeded.
pub fn contributing_weights(
    base: &BTreeMap<ProviderName, f64>,
    results: &[ModelResponse],
) -> BTreeMap<ProviderName, f64> {
    let mut weights = BTreeMap::new();
    for result in results.iter().filter(|r| r.success) {
        let weight = base
            .get(&result.provider_name)
            .copied()
            .unwrap_or(0.0)
            .max(0.0);
        weights.insert(result.provider_name, weight);
    }
    renormalize(&mut weights);
    weights
}

/// Scale the map in place so its values sum to 1.0.
///
/// When every value is zero the mass is split evenly.
pub fn renormalize(weights: &mut BTreeMap<ProviderName, f64>) {
    if weights.is_empty() {
        return;
    }
    let total: f64 = weights.values().sum();
    if total <= f64::EPSILON {
        let even = 1.0 / weights.len() as f64;
        weights.values_mut().for_each(|w| *w = even);
    } else {
        weights.values_mut().for_each(|w| *w /= total);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
