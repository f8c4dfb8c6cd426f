//! Annotation-set quality scoring and count-based confidence.
//!
//! Pure functions shared by the orchestrator (to score synthesized output)
//! and the quality controller (to judge content specificity). Safe to call
//! on partial or intermediate annotation sets.

use std::collections::HashSet;

use crate::annotation::Annotation;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Annotation count of a professional-grade audit.
pub const TARGET_ANNOTATION_COUNT: usize = 18;

/// Distinct categories needed for full diversity credit.
pub const TARGET_CATEGORY_COUNT: usize = 5;

/// Average feedback length (characters) needed for full depth credit.
pub const TARGET_FEEDBACK_LENGTH: f64 = 100.0;

pub const COUNT_WEIGHT: f64 = 0.4;
pub const DIVERSITY_WEIGHT: f64 = 0.3;
pub const DEPTH_WEIGHT: f64 = 0.3;

/// Inclusive lower bound of the "excellent" annotation band.
pub const EXCELLENT_BAND_MIN: usize = 16;
/// Inclusive upper bound of the "excellent" annotation band.
pub const EXCELLENT_BAND_MAX: usize = 19;
/// Minimum annotation count for an "acceptable" result.
pub const ACCEPTABLE_MIN: usize = 12;
/// Self-reported confidence required to enter the excellent band.
pub const EXCELLENT_REPORTED_CONFIDENCE: f64 = 0.85;

pub const EXCELLENT_CONFIDENCE: f64 = 0.95;
pub const ACCEPTABLE_CONFIDENCE: f64 = 0.80;
pub const INSUFFICIENT_CONFIDENCE: f64 = 0.50;

// ---------------------------------------------------------------------------
// Sub-scores
// ---------------------------------------------------------------------------

/// `min(count / 18, 1)`.
pub fn count_score(annotations: &[Annotation]) -> f64 {
    (annotations.len() as f64 / TARGET_ANNOTATION_COUNT as f64).min(1.0)
}

/// `min(distinct categories / 5, 1)`. Categories compare case-insensitively.
pub fn diversity_score(annotations: &[Annotation]) -> f64 {
    let categories: HashSet<String> = annotations
        .iter()
        .map(|a| a.category.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    (categories.len() as f64 / TARGET_CATEGORY_COUNT as f64).min(1.0)
}

/// `min(average feedback length / 100, 1)`; `0.0` for an empty set.
pub fn depth_score(annotations: &[Annotation]) -> f64 {
    if annotations.is_empty() {
        return 0.0;
    }
    let total: usize = annotations.iter().map(|a| a.feedback.chars().count()).sum();
    let average = total as f64 / annotations.len() as f64;
    (average / TARGET_FEEDBACK_LENGTH).min(1.0)
}

/// Weighted quality of an annotation set in `[0, 1]`.
///
/// `0.4 * count + 0.3 * diversity + 0.3 * depth`.
pub fn score_annotation_quality(annotations: &[Annotation]) -> f64 {
    if annotations.is_empty() {
        return 0.0;
    }
    COUNT_WEIGHT * count_score(annotations)
        + DIVERSITY_WEIGHT * diversity_score(annotations)
        + DEPTH_WEIGHT * depth_score(annotations)
}

/// Depth credit for a single annotation, `min(feedback length / 100, 1)`.
pub fn feedback_specificity(annotation: &Annotation) -> f64 {
    (annotation.feedback.chars().count() as f64 / TARGET_FEEDBACK_LENGTH).min(1.0)
}

// ---------------------------------------------------------------------------
// Count-based confidence
// ---------------------------------------------------------------------------

/// Recompute a provider's confidence from its annotation count.
///
/// The provider's own figure only matters as the gate into the excellent
/// band; everything else is derived from the count.
pub fn confidence_for_count(count: usize, reported_confidence: f64) -> f64 {
    if (EXCELLENT_BAND_MIN..=EXCELLENT_BAND_MAX).contains(&count)
        && reported_confidence >= EXCELLENT_REPORTED_CONFIDENCE
    {
        EXCELLENT_CONFIDENCE
    } else if count >= ACCEPTABLE_MIN {
        ACCEPTABLE_CONFIDENCE
    } else {
        INSUFFICIENT_CONFIDENCE
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Severity;

    fn annotations(n: usize, categories: &[&str], feedback_len: usize) -> Vec<Annotation> {
        (0..n)
            .map(|i| {
                Annotation::new(
                    format!("a-{i}"),
                    0,
                    (i * 5 % 100) as f64,
                    (i * 7 % 100) as f64,
                    Severity::Suggested,
                    categories[i % categories.len()],
                    "x".repeat(feedback_len),
                )
            })
            .collect()
    }

    #[test]
    fn empty_set_scores_zero() {
        assert_eq!(score_annotation_quality(&[]), 0.0);
    }

    #[test]
    fn perfect_set_scores_one() {
        let set = annotations(18, &["a", "b", "c", "d", "e"], 120);
        assert!((score_annotation_quality(&set) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn count_is_capped_at_target() {
        let set = annotations(30, &["a"], 10);
        assert_eq!(count_score(&set), 1.0);
    }

    #[test]
    fn partial_scores_combine_with_weights() {
        // 9/18 count, 1/5 diversity, 50/100 depth.
        let set = annotations(9, &["layout"], 50);
        let expected = 0.4 * 0.5 + 0.3 * 0.2 + 0.3 * 0.5;
        assert!((score_annotation_quality(&set) - expected).abs() < 1e-9);
    }

    #[test]
    fn categories_compare_case_insensitively() {
        let set = annotations(4, &["Layout", "layout", " LAYOUT ", "copy"], 10);
        assert!((diversity_score(&set) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn scoring_is_pure() {
        let set = annotations(11, &["a", "b", "c"], 73);
        assert_eq!(
            score_annotation_quality(&set),
            score_annotation_quality(&set)
        );
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(confidence_for_count(18, 0.9), EXCELLENT_CONFIDENCE);
        assert_eq!(confidence_for_count(18, 0.6), ACCEPTABLE_CONFIDENCE);
        assert_eq!(confidence_for_count(14, 0.99), ACCEPTABLE_CONFIDENCE);
        assert_eq!(confidence_for_count(20, 0.99), ACCEPTABLE_CONFIDENCE);
        assert_eq!(confidence_for_count(11, 1.0), INSUFFICIENT_CONFIDENCE);
        assert_eq!(confidence_for_count(0, 0.0), INSUFFICIENT_CONFIDENCE);
    }
}
