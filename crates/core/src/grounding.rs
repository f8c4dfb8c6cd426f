//! Visual grounding and hallucination heuristics for annotation sets.
//!
//! Each detector is applied independently; an annotation's result is the
//! union of everything that fired for it. The detectors are public so the
//! quality controller can re-run them at the aggregate level.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Center of the percentage coordinate space.
pub const CENTER_POINT: (f64, f64) = (50.0, 50.0);

/// Distance from the center counted as "central placement".
pub const CENTER_RADIUS: f64 = 10.0;

/// Share of annotations near the center above which placement looks guessed.
pub const CENTER_CLUSTER_RATIO: f64 = 0.4;

/// More than this many annotations on one rounded point is suspicious.
pub const MAX_SHARED_POINT: usize = 2;

/// Feedback with more than this many hedging phrases reads as generic.
pub const MAX_GENERIC_PHRASES: usize = 1;

/// Title + feedback shorter than this many words is too brief to be grounded.
pub const MIN_GROUNDED_WORDS: usize = 5;

/// Per-annotation confidence below which an annotation is invalid.
pub const MIN_GROUNDING_CONFIDENCE: f64 = 0.4;

pub const CLUSTER_PENALTY: f64 = 0.3;
pub const DUPLICATE_PENALTY: f64 = 0.2;
pub const GENERIC_PENALTY: f64 = 0.2;
pub const TRIVIAL_PENALTY: f64 = 0.2;

pub const VALID_FRACTION_WEIGHT: f64 = 0.7;
pub const MEAN_CONFIDENCE_WEIGHT: f64 = 0.3;

/// Hedging phrases typical of feedback not anchored in the actual image.
pub const GENERIC_PHRASES: &[&str] = &[
    "consider adding",
    "could be improved",
    "might benefit",
    "should include",
    "would help",
    "may want to",
    "could use",
    "might consider",
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Machine-readable reason a detector fired for an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundingFlag {
    CoordinateOutOfRange,
    ImageIndexOutOfRange,
    EmptyFeedback,
    CenterClustered,
    DuplicateCoordinates,
    GenericPhrasing,
    Trivial,
}

impl GroundingFlag {
    /// Flags that invalidate an annotation regardless of confidence.
    pub fn is_disqualifying(&self) -> bool {
        matches!(
            self,
            Self::CoordinateOutOfRange | Self::ImageIndexOutOfRange | Self::EmptyFeedback
        )
    }
}

/// Grounding verdict for a single annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingValidationResult {
    pub annotation_id: String,
    pub is_valid: bool,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub suggested_corrections: Vec<String>,
    pub flags: Vec<GroundingFlag>,
}

impl GroundingValidationResult {
    pub fn has_flag(&self, flag: GroundingFlag) -> bool {
        self.flags.contains(&flag)
    }
}

// ---------------------------------------------------------------------------
// Detectors
// ---------------------------------------------------------------------------

fn near_center(annotation: &Annotation) -> bool {
    let dx = annotation.x - CENTER_POINT.0;
    let dy = annotation.y - CENTER_POINT.1;
    (dx * dx + dy * dy).sqrt() <= CENTER_RADIUS
}

/// Indices of centrally placed annotations, if they exceed the cluster ratio.
///
/// Returns an empty vector when the set does not look clustered.
pub fn detect_center_clustering(annotations: &[Annotation]) -> Vec<usize> {
    if annotations.is_empty() {
        return Vec::new();
    }
    let central: Vec<usize> = annotations
        .iter()
        .enumerate()
        .filter(|(_, a)| near_center(a))
        .map(|(i, _)| i)
        .collect();

    let ratio = central.len() as f64 / annotations.len() as f64;
    if ratio > CENTER_CLUSTER_RATIO {
        central
    } else {
        Vec::new()
    }
}

/// Indices of annotations sharing a rounded integer point with more than
/// [`MAX_SHARED_POINT`] others on the same image, in input order.
pub fn detect_duplicate_coordinates(annotations: &[Annotation]) -> Vec<usize> {
    let mut groups: HashMap<(usize, i64, i64), Vec<usize>> = HashMap::new();
    for (i, a) in annotations.iter().enumerate() {
        if !a.x.is_finite() || !a.y.is_finite() {
            continue;
        }
        let key = (a.image_index, a.x.round() as i64, a.y.round() as i64);
        groups.entry(key).or_default().push(i);
    }

    let mut indices: Vec<usize> = groups
        .into_values()
        .filter(|members| members.len() > MAX_SHARED_POINT)
        .flatten()
        .collect();
    indices.sort_unstable();
    indices
}

/// Number of distinct hedging phrases present in `text`.
pub fn count_generic_phrases(text: &str) -> usize {
    let lowered = text.to_lowercase();
    GENERIC_PHRASES
        .iter()
        .filter(|phrase| lowered.contains(*phrase))
        .count()
}

/// Whether the annotation's feedback reads as generic filler.
pub fn is_generic(annotation: &Annotation) -> bool {
    count_generic_phrases(&annotation.full_text()) > MAX_GENERIC_PHRASES
}

/// Whether title + feedback is too brief to be visually grounded.
pub fn is_trivial(annotation: &Annotation) -> bool {
    annotation.word_count() < MIN_GROUNDED_WORDS
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate every annotation against the images' coordinate space and the
/// hallucination heuristics. One result per annotation, in input order.
///
/// `image_urls` may be empty, in which case `image_index` is not checked.
pub fn validate_grounding(
    annotations: &[Annotation],
    image_urls: &[String],
) -> Vec<GroundingValidationResult> {
    let clustered = detect_center_clustering(annotations);
    let duplicated = detect_duplicate_coordinates(annotations);

    annotations
        .iter()
        .enumerate()
        .map(|(i, annotation)| {
            let mut flags = Vec::new();
            let mut reasons = Vec::new();
            let mut corrections = Vec::new();
            let mut confidence: f64 = 1.0;

            if !annotation.has_valid_coordinates() {
                flags.push(GroundingFlag::CoordinateOutOfRange);
                reasons.push(format!(
                    "coordinates ({}, {}) fall outside the 0-100 image space",
                    annotation.x, annotation.y
                ));
                corrections.push("Re-anchor the annotation on the visible UI element".to_string());
                confidence = 0.0;
            }

            if !image_urls.is_empty() && annotation.image_index >= image_urls.len() {
                flags.push(GroundingFlag::ImageIndexOutOfRange);
                reasons.push(format!(
                    "image index {} does not match any of the {} uploaded images",
                    annotation.image_index,
                    image_urls.len()
                ));
                corrections.push("Attach the annotation to an uploaded image".to_string());
                confidence = 0.0;
            }

            if annotation.feedback.trim().is_empty() {
                flags.push(GroundingFlag::EmptyFeedback);
                reasons.push("feedback text is empty".to_string());
                corrections.push("Describe the issue observed at this location".to_string());
                confidence = 0.0;
            }

            if clustered.contains(&i) {
                flags.push(GroundingFlag::CenterClustered);
                reasons.push("placed in a suspicious cluster around the image center".to_string());
                corrections
                    .push("Verify the position against the element it describes".to_string());
                confidence -= CLUSTER_PENALTY;
            }

            if duplicated.contains(&i) {
                flags.push(GroundingFlag::DuplicateCoordinates);
                reasons
                    .push("shares its exact position with several other annotations".to_string());
                corrections.push("Spread annotations onto their distinct targets".to_string());
                confidence -= DUPLICATE_PENALTY;
            }

            if is_generic(annotation) {
                flags.push(GroundingFlag::GenericPhrasing);
                reasons.push("feedback relies on generic hedging phrases".to_string());
                corrections
                    .push("Reference concrete visual details (labels, colors, sizes)".to_string());
                confidence -= GENERIC_PENALTY;
            }

            if is_trivial(annotation) {
                flags.push(GroundingFlag::Trivial);
                reasons.push(format!("feedback has fewer than {MIN_GROUNDED_WORDS} words"));
                corrections.push("Expand the feedback with what is wrong and why".to_string());
                confidence -= TRIVIAL_PENALTY;
            }

            let confidence = confidence.clamp(0.0, 1.0);
            let is_valid = !flags.iter().any(GroundingFlag::is_disqualifying)
                && confidence >= MIN_GROUNDING_CONFIDENCE;

            GroundingValidationResult {
                annotation_id: annotation.id.clone(),
                is_valid,
                confidence,
                reasons,
                suggested_corrections: corrections,
                flags,
            }
        })
        .collect()
}

/// `0.7 * valid fraction + 0.3 * mean confidence`; `0.0` for no results.
pub fn visual_grounding_score(results: &[GroundingValidationResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let n = results.len() as f64;
    let valid = results.iter().filter(|r| r.is_valid).count() as f64;
    let mean_confidence = results.iter().map(|r| r.confidence).sum::<f64>() / n;
    VALID_FRACTION_WEIGHT * (valid / n) + MEAN_CONFIDENCE_WEIGHT * mean_confidence
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
