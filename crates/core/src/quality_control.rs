//! Analysis quality control: grounding, hallucination, coordinate and
//! specificity checks combined into one pass/fail/retry decision.
//!
//! Detected problems are data ([`QualityIssue`] records), never errors.
//! The only control-flow signal is [`QualityControlResult::should_retry`],
//! which callers may act on by re-running the analysis; this module never
//! loops on its own.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::grounding::{
    detect_center_clustering, detect_duplicate_coordinates, is_generic, is_trivial,
    validate_grounding, visual_grounding_score, GroundingFlag,
};
use crate::model_response::ModelResponse;
use crate::scoring::feedback_specificity;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default minimum acceptable overall quality.
pub const DEFAULT_MINIMUM_QUALITY_THRESHOLD: f64 = 0.7;

/// Retrieval hallucination risk above which a high-severity issue is raised.
pub const RAG_RISK_THRESHOLD: f64 = 0.7;

/// Annotations whose feedback specificity falls below this are reported.
pub const MIN_SPECIFICITY: f64 = 0.4;

pub const GROUNDING_WEIGHT: f64 = 0.4;
pub const RAG_QUALITY_WEIGHT: f64 = 0.3;
pub const RISK_WEIGHT: f64 = 0.3;

pub const CRITICAL_ISSUE_PENALTY: f64 = 0.2;
pub const HIGH_ISSUE_PENALTY: f64 = 0.1;

pub const CLUSTER_RISK: f64 = 0.2;
pub const DUPLICATE_RISK: f64 = 0.1;

/// Share of the hallucination risk taken from the retrieval layer when used.
pub const RAG_RISK_SHARE: f64 = 0.3;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    VisualGrounding,
    Hallucination,
    CoordinateAccuracy,
    ContentSpecificity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: IssueSeverity,
    pub description: String,
    pub affected_annotation_ids: BTreeSet<String>,
    pub suggested_fix: String,
}

impl QualityIssue {
    fn new(
        issue_type: IssueType,
        severity: IssueSeverity,
        description: impl Into<String>,
        affected: impl IntoIterator<Item = String>,
        suggested_fix: impl Into<String>,
    ) -> Self {
        Self {
            issue_type,
            severity,
            description: description.into(),
            affected_annotation_ids: affected.into_iter().collect(),
            suggested_fix: suggested_fix.into(),
        }
    }
}

/// Signals from the retrieval layer, when retrieval context was used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagQualityInputs {
    pub rag_quality_score: f64,
    pub hallucination_risk: f64,
}

/// Stage toggles; every stage is on by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityControlOptions {
    pub enable_visual_grounding: bool,
    pub enable_hallucination_detection: bool,
    pub enable_coordinate_validation: bool,
    pub enable_content_specificity: bool,
    pub minimum_quality_threshold: f64,
}

impl Default for QualityControlOptions {
    fn default() -> Self {
        Self {
            enable_visual_grounding: true,
            enable_hallucination_detection: true,
            enable_coordinate_validation: true,
            enable_content_specificity: true,
            minimum_quality_threshold: DEFAULT_MINIMUM_QUALITY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityControlResult {
    pub overall_quality: f64,
    pub visual_grounding_score: f64,
    pub hallucination_risk: f64,
    /// Order-preserving subset of the input annotations.
    pub validated_annotations: Vec<Annotation>,
    pub quality_issues: Vec<QualityIssue>,
    pub recommendations: Vec<String>,
    pub should_retry: bool,
}

impl QualityControlResult {
    pub fn count_by_severity(&self, severity: IssueSeverity) -> usize {
        self.quality_issues
            .iter()
            .filter(|i| i.severity == severity)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn ids_of<'a>(annotations: impl IntoIterator<Item = &'a Annotation>) -> Vec<String> {
    annotations.into_iter().map(|a| a.id.clone()).collect()
}

/// Run every enabled quality stage over a finalized annotation set.
pub fn perform_quality_control(
    annotations: &[Annotation],
    image_urls: &[String],
    rag: Option<&RagQualityInputs>,
    options: &QualityControlOptions,
) -> QualityControlResult {
    if annotations.is_empty() {
        return empty_result(options);
    }

    let mut issues = Vec::new();

    // -- Stage 1: visual grounding -----------------------------------------

    let (mut working, grounding_score) = if options.enable_visual_grounding {
        let results = validate_grounding(annotations, image_urls);
        let score = visual_grounding_score(&results);

        let flagged = |flag: GroundingFlag| -> Vec<String> {
            results
                .iter()
                .filter(|r| r.has_flag(flag))
                .map(|r| r.annotation_id.clone())
                .collect()
        };

        let out_of_range = flagged(GroundingFlag::CoordinateOutOfRange);
        if !out_of_range.is_empty() {
            issues.push(QualityIssue::new(
                IssueType::CoordinateAccuracy,
                IssueSeverity::Critical,
                format!(
                    "{} annotation(s) placed outside the 0-100 coordinate space",
                    out_of_range.len()
                ),
                out_of_range,
                "Re-run the analysis and require percentage coordinates within the image",
            ));
        }

        let missing_image = flagged(GroundingFlag::ImageIndexOutOfRange);
        if !missing_image.is_empty() {
            issues.push(QualityIssue::new(
                IssueType::VisualGrounding,
                IssueSeverity::High,
                format!(
                    "{} annotation(s) reference an image that was not uploaded",
                    missing_image.len()
                ),
                missing_image,
                "Attach each annotation to one of the analyzed images",
            ));
        }

        let weakly_grounded: Vec<String> = results
            .iter()
            .filter(|r| {
                !r.is_valid
                    && !r.has_flag(GroundingFlag::CoordinateOutOfRange)
                    && !r.has_flag(GroundingFlag::ImageIndexOutOfRange)
            })
            .map(|r| r.annotation_id.clone())
            .collect();
        if !weakly_grounded.is_empty() {
            issues.push(QualityIssue::new(
                IssueType::VisualGrounding,
                IssueSeverity::Medium,
                format!(
                    "{} annotation(s) dropped for insufficient visual grounding",
                    weakly_grounded.len()
                ),
                weakly_grounded,
                "Anchor feedback on concrete, visible interface elements",
            ));
        }

        let kept: Vec<Annotation> = annotations
            .iter()
            .zip(&results)
            .filter(|(_, r)| r.is_valid)
            .map(|(a, _)| a.clone())
            .collect();
        (kept, score)
    } else {
        let in_range = annotations.iter().filter(|a| a.has_valid_coordinates()).count();
        (annotations.to_vec(), in_range as f64 / annotations.len() as f64)
    };

    // -- Stage 2: hallucination heuristics ---------------------------------

    let mut hallucination_risk = 0.0;
    if options.enable_hallucination_detection && !working.is_empty() {
        let clustered = detect_center_clustering(&working);
        if !clustered.is_empty() {
            issues.push(QualityIssue::new(
                IssueType::VisualGrounding,
                IssueSeverity::High,
                format!(
                    "{} of {} annotations cluster around the image center",
                    clustered.len(),
                    working.len()
                ),
                ids_of(clustered.iter().map(|&i| &working[i])),
                "Verify each annotation is placed on the element it describes",
            ));
        }

        let duplicated = detect_duplicate_coordinates(&working);
        if !duplicated.is_empty() {
            issues.push(QualityIssue::new(
                IssueType::CoordinateAccuracy,
                IssueSeverity::Medium,
                format!(
                    "{} annotations share identical coordinates",
                    duplicated.len()
                ),
                ids_of(duplicated.iter().map(|&i| &working[i])),
                "Give each finding its own location on the screenshot",
            ));
        }

        let generic: Vec<&Annotation> = working.iter().filter(|a| is_generic(a)).collect();
        if !generic.is_empty() {
            issues.push(QualityIssue::new(
                IssueType::Hallucination,
                IssueSeverity::Medium,
                format!("{} annotation(s) use generic hedging language", generic.len()),
                ids_of(generic.iter().copied()),
                "Replace hedged suggestions with observations about specific elements",
            ));
        }

        let trivial: Vec<&Annotation> = working.iter().filter(|a| is_trivial(a)).collect();
        if !trivial.is_empty() {
            issues.push(QualityIssue::new(
                IssueType::Hallucination,
                IssueSeverity::Medium,
                format!(
                    "{} annotation(s) are too brief to be visually grounded",
                    trivial.len()
                ),
                ids_of(trivial.iter().copied()),
                "Explain what is wrong at the location and why it matters",
            ));
        }

        let flagged: BTreeSet<&str> = generic
            .iter()
            .chain(trivial.iter())
            .map(|a| a.id.as_str())
            .collect();
        let mut risk = flagged.len() as f64 / working.len() as f64;
        if !clustered.is_empty() {
            risk += CLUSTER_RISK;
        }
        if !duplicated.is_empty() {
            risk += DUPLICATE_RISK;
        }
        risk = risk.min(1.0);

        if let Some(rag) = rag {
            if rag.hallucination_risk > RAG_RISK_THRESHOLD {
                issues.push(QualityIssue::new(
                    IssueType::Hallucination,
                    IssueSeverity::High,
                    format!(
                        "retrieval context has a high hallucination risk ({:.2})",
                        rag.hallucination_risk
                    ),
                    Vec::new(),
                    "Refresh the knowledge base or run the analysis without retrieval context",
                ));
            }
            risk = (1.0 - RAG_RISK_SHARE) * risk
                + RAG_RISK_SHARE * rag.hallucination_risk.clamp(0.0, 1.0);
        }

        hallucination_risk = risk.clamp(0.0, 1.0);
    }

    // -- Stage 3: strict coordinate validation -----------------------------

    let (in_range, out_of_range): (Vec<Annotation>, Vec<Annotation>) = working
        .into_iter()
        .partition(Annotation::has_valid_coordinates);
    working = in_range;
    if options.enable_coordinate_validation && !out_of_range.is_empty() {
        issues.push(QualityIssue::new(
            IssueType::CoordinateAccuracy,
            IssueSeverity::Critical,
            format!(
                "{} annotation(s) failed strict coordinate validation",
                out_of_range.len()
            ),
            ids_of(&out_of_range),
            "Re-run the analysis and require percentage coordinates within the image",
        ));
    }

    // -- Stage 4: content specificity --------------------------------------

    if options.enable_content_specificity {
        let vague: Vec<&Annotation> = working
            .iter()
            .filter(|a| feedback_specificity(a) < MIN_SPECIFICITY)
            .collect();
        if !vague.is_empty() {
            issues.push(QualityIssue::new(
                IssueType::ContentSpecificity,
                IssueSeverity::Low,
                format!("{} annotation(s) have thin feedback", vague.len()),
                ids_of(vague.iter().copied()),
                "Add detail on the affected element and the expected improvement",
            ));
        }
    }

    // -- Stage 5: overall score --------------------------------------------

    let rag_quality = rag
        .map(|r| r.rag_quality_score.clamp(0.0, 1.0))
        .unwrap_or(grounding_score);
    let critical = issues
        .iter()
        .filter(|i| i.severity == IssueSeverity::Critical)
        .count();
    let high = issues
        .iter()
        .filter(|i| i.severity == IssueSeverity::High)
        .count();

    let overall_quality = (GROUNDING_WEIGHT * grounding_score
        + RAG_QUALITY_WEIGHT * rag_quality
        + RISK_WEIGHT * (1.0 - hallucination_risk)
        - CRITICAL_ISSUE_PENALTY * critical as f64
        - HIGH_ISSUE_PENALTY * high as f64)
        .clamp(0.0, 1.0);

    // -- Stage 6: retry decision -------------------------------------------

    let should_retry = decide_retry(overall_quality, &issues, options.minimum_quality_threshold);
    let recommendations = generate_recommendations(&issues);

    QualityControlResult {
        overall_quality,
        visual_grounding_score: grounding_score,
        hallucination_risk,
        validated_annotations: working,
        quality_issues: issues,
        recommendations,
        should_retry,
    }
}

/// Retry only when quality is below threshold *and* something critical was found.
pub fn decide_retry(overall_quality: f64, issues: &[QualityIssue], threshold: f64) -> bool {
    overall_quality < threshold
        && issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Critical)
}

fn empty_result(options: &QualityControlOptions) -> QualityControlResult {
    let issues = vec![QualityIssue::new(
        IssueType::VisualGrounding,
        IssueSeverity::Critical,
        "no annotations were produced for the analyzed images",
        Vec::new(),
        "Re-run the analysis; check provider availability if this persists",
    )];
    let should_retry = decide_retry(0.0, &issues, options.minimum_quality_threshold);
    let recommendations = generate_recommendations(&issues);
    QualityControlResult {
        overall_quality: 0.0,
        visual_grounding_score: 0.0,
        hallucination_risk: 0.0,
        validated_annotations: Vec::new(),
        quality_issues: issues,
        recommendations,
        should_retry,
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

fn affected_count(issues: &[QualityIssue], issue_type: IssueType) -> (usize, usize) {
    let matching: Vec<&QualityIssue> = issues
        .iter()
        .filter(|i| i.issue_type == issue_type)
        .collect();
    let ids: BTreeSet<&String> = matching
        .iter()
        .flat_map(|i| i.affected_annotation_ids.iter())
        .collect();
    (matching.len(), ids.len())
}

/// Human-readable advice summarizing the issue list.
pub fn generate_recommendations(issues: &[QualityIssue]) -> Vec<String> {
    let mut recommendations = Vec::new();

    let (coordinate_issues, coordinate_ids) =
        affected_count(issues, IssueType::CoordinateAccuracy);
    if coordinate_issues > 0 {
        recommendations.push(format!(
            "Review annotation placement: {coordinate_ids} annotation(s) had \
             inaccurate or out-of-range coordinates."
        ));
    }

    let (grounding_issues, grounding_ids) = affected_count(issues, IssueType::VisualGrounding);
    if grounding_issues > 0 {
        if grounding_ids == 0 {
            recommendations.push(
                "No grounded annotations are available; re-run the analysis.".to_string(),
            );
        } else {
            recommendations.push(format!(
                "Strengthen visual grounding: {grounding_ids} annotation(s) were \
                 clustered, unanchored or weakly grounded."
            ));
        }
    }

    let (hallucination_issues, hallucination_ids) =
        affected_count(issues, IssueType::Hallucination);
    if hallucination_issues > 0 {
        recommendations.push(format!(
            "Request element-specific observations: {hallucination_issues} \
             hallucination signal(s) across {hallucination_ids} annotation(s)."
        ));
    }

    let (specificity_issues, specificity_ids) =
        affected_count(issues, IssueType::ContentSpecificity);
    if specificity_issues > 0 {
        recommendations.push(format!(
            "Expand feedback detail for {specificity_ids} annotation(s)."
        ));
    }

    if issues.iter().any(|i| i.severity == IssueSeverity::Critical) {
        recommendations.push(
            "Critical issues were found; consider re-running the analysis.".to_string(),
        );
    }

    if recommendations.is_empty() {
        recommendations.push("Annotation set passed all quality checks.".to_string());
    }

    recommendations
}

/// One line per failed provider call, for surfacing alongside quality advice.
pub fn recommendations_for_failures(model_results: &[ModelResponse]) -> Vec<String> {
    model_results
        .iter()
        .filter(|r| !r.success)
        .map(|r| {
            let category = r.error_category.map(|c| c.as_str()).unwrap_or("unknown");
            match &r.error {
                Some(error) => format!("{} failed ({category}): {error}", r.provider_name),
                None => format!("{} failed ({category})", r.provider_name),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Severity;
    use crate::model_response::{ErrorCategory, ProviderName};

    const DETAILED: &str = "The primary checkout button uses 12px grey text on a teal fill, \
                            giving a 2.1:1 contrast ratio that fails WCAG AA for body text";

    fn at(id: &str, x: f64, y: f64) -> Annotation {
        Annotation::new(id, 0, x, y, Severity::Important, "accessibility", DETAILED)
    }

    /// Well spread, detailed annotations that pass every check.
    fn clean(n: usize) -> Vec<Annotation> {
        (0..n)
            .map(|i| {
                let x = 5.0 + (i % 4) as f64 * 25.0;
                let y = 5.0 + (i / 4) as f64 * 25.0;
                at(&format!("a-{i}"), x, y)
            })
            .collect()
    }

    fn urls() -> Vec<String> {
        vec!["https://cdn.example.com/shot-0.png".to_string()]
    }

    fn check(annotations: &[Annotation]) -> QualityControlResult {
        let options = QualityControlOptions::default();
        perform_quality_control(annotations, &urls(), None, &options)
    }

    #[test]
    fn clean_set_passes() {
        let result = check(&clean(8));
        assert!(result.quality_issues.is_empty());
        assert_eq!(result.validated_annotations.len(), 8);
        assert!((result.overall_quality - 1.0).abs() < 1e-9);
        assert!(!result.should_retry);
        assert_eq!(
            result.recommendations,
            vec!["Annotation set passed all quality checks."]
        );
    }

    #[test]
    fn out_of_range_annotation_is_removed_and_critical() {
        let mut anns = clean(4);
        anns.push(at("bad", 150.0, 40.0));
        let result = check(&anns);

        assert!(result.validated_annotations.iter().all(|a| a.id != "bad"));
        let issue = result
            .quality_issues
            .iter()
            .find(|i| i.issue_type == IssueType::CoordinateAccuracy)
            .expect("coordinate issue");
        assert_eq!(issue.severity, IssueSeverity::Critical);
        assert!(issue.affected_annotation_ids.contains("bad"));
    }

    #[test]
    fn center_cluster_raises_high_issue_and_risk() {
        let mut anns = clean(5);
        for (i, (x, y)) in [(45.0, 45.0), (55.0, 55.0), (50.0, 50.0), (47.0, 53.0), (53.0, 47.0)]
            .into_iter()
            .enumerate()
        {
            anns.push(at(&format!("c-{i}"), x, y));
        }
        let result = check(&anns);

        let issue = result
            .quality_issues
            .iter()
            .find(|i| {
                i.issue_type == IssueType::VisualGrounding && i.severity == IssueSeverity::High
            })
            .expect("clustering issue");
        assert_eq!(issue.affected_annotation_ids.len(), 5);
        assert!((result.hallucination_risk - CLUSTER_RISK).abs() < 1e-9);
        assert_eq!(result.validated_annotations.len(), 10);
    }

    #[test]
    fn generic_phrasing_is_medium_hallucination() {
        let mut anns = clean(4);
        let mut generic = at("g", 70.0, 80.0);
        generic.feedback = "Consider adding more contrast. Could be improved with spacing. \
                            Should include icons."
            .into();
        anns.push(generic);
        let result = check(&anns);

        let issue = result
            .quality_issues
            .iter()
            .find(|i| i.issue_type == IssueType::Hallucination)
            .expect("hallucination issue");
        assert_eq!(issue.severity, IssueSeverity::Medium);
        assert!(issue.affected_annotation_ids.contains("g"));
        assert!(result.hallucination_risk > 0.0);
    }

    #[test]
    fn coordinates_filtered_even_with_every_stage_disabled() {
        let mut anns = clean(3);
        anns.push(at("bad", 40.0, -3.0));
        let options = QualityControlOptions {
            enable_visual_grounding: false,
            enable_hallucination_detection: false,
            enable_coordinate_validation: false,
            enable_content_specificity: false,
            ..Default::default()
        };
        let result = perform_quality_control(&anns, &[], None, &options);
        assert_eq!(result.validated_annotations.len(), 3);
        assert!(result.quality_issues.is_empty());
    }

    #[test]
    fn strict_stage_catches_what_grounding_skipped() {
        let mut anns = clean(3);
        anns.push(at("bad", 101.0, 50.0));
        let options = QualityControlOptions {
            enable_visual_grounding: false,
            ..Default::default()
        };
        let result = perform_quality_control(&anns, &urls(), None, &options);
        assert!(result.quality_issues.iter().any(|i| {
            i.severity == IssueSeverity::Critical && i.affected_annotation_ids.contains("bad")
        }));
    }

    #[test]
    fn validated_annotations_are_always_in_range() {
        let anns = vec![
            at("a", 0.0, 0.0),
            at("b", 100.0, 100.0),
            at("c", 100.5, 3.0),
            at("d", f64::INFINITY, 3.0),
            at("e", 30.0, 60.0),
        ];
        let result = check(&anns);
        for a in &result.validated_annotations {
            assert!((0.0..=100.0).contains(&a.x) && (0.0..=100.0).contains(&a.y));
        }
        assert_eq!(result.validated_annotations.len(), 3);
    }

    #[test]
    fn high_rag_risk_is_flagged() {
        let rag = RagQualityInputs {
            rag_quality_score: 0.4,
            hallucination_risk: 0.9,
        };
        let options = QualityControlOptions::default();
        let result = perform_quality_control(&clean(6), &urls(), Some(&rag), &options);
        assert!(result.quality_issues.iter().any(|i| {
            i.issue_type == IssueType::Hallucination && i.severity == IssueSeverity::High
        }));
        assert!((result.hallucination_risk - 0.27).abs() < 1e-9);
        let expected = 0.4 * 1.0 + 0.3 * 0.4 + 0.3 * (1.0 - 0.27) - 0.1;
        assert!((result.overall_quality - expected).abs() < 1e-9);
    }

    #[test]
    fn empty_input_scores_zero_and_retries() {
        let result = check(&[]);
        assert_eq!(result.overall_quality, 0.0);
        assert!(result.should_retry);
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn retry_requires_low_quality_and_a_critical_issue() {
        let critical = QualityIssue::new(
            IssueType::CoordinateAccuracy,
            IssueSeverity::Critical,
            "x",
            vec!["a".to_string()],
            "fix",
        );
        let high = QualityIssue::new(
            IssueType::VisualGrounding,
            IssueSeverity::High,
            "y",
            Vec::new(),
            "fix",
        );

        assert!(decide_retry(0.5, &[critical.clone()], 0.7));
        assert!(!decide_retry(0.5, &[high], 0.7));
        assert!(!decide_retry(0.75, &[critical], 0.7));
        assert!(!decide_retry(0.1, &[], 0.7));
    }

    #[test]
    fn retry_never_fires_without_critical_issues() {
        // Low quality driven by vague, clustered feedback but nothing critical.
        let anns: Vec<Annotation> = (0..6)
            .map(|i| {
                let mut a = at(&format!("v-{i}"), 50.0, 50.0 + i as f64);
                a.feedback = "Contrast could use work here".into();
                a
            })
            .collect();
        let result = check(&anns);
        assert_eq!(result.count_by_severity(IssueSeverity::Critical), 0);
        assert!(!result.should_retry);
    }

    #[test]
    fn thin_feedback_is_a_low_specificity_issue() {
        let mut anns = clean(3);
        anns[0].feedback = "Search field lacks a visible label".into();
        let result = check(&anns);
        let issue = result
            .quality_issues
            .iter()
            .find(|i| i.issue_type == IssueType::ContentSpecificity)
            .expect("specificity issue");
        assert_eq!(issue.severity, IssueSeverity::Low);
        assert!(issue.affected_annotation_ids.contains("a-0"));
    }

    #[test]
    fn failure_notes_list_failed_providers() {
        let results = vec![
            ModelResponse::failed(
                ProviderName::Claude,
                "request timed out",
                ErrorCategory::Timeout,
                35_000,
            ),
            ModelResponse::succeeded(ProviderName::Openai, clean(3), 0.8, 900),
        ];
        let notes = recommendations_for_failures(&results);
        assert_eq!(notes, vec!["claude failed (timeout): request timed out"]);
    }
}
