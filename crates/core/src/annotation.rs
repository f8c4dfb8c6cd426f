//! Located design-feedback annotations and their validation helpers.
//!
//! Coordinates live in a percentage-of-image space: `(0, 0)` is the
//! top-left corner and `(100, 100)` the bottom-right corner of the image
//! selected by `image_index`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lowest valid coordinate on either axis.
pub const COORDINATE_MIN: f64 = 0.0;

/// Highest valid coordinate on either axis.
pub const COORDINATE_MAX: f64 = 100.0;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// How urgently a piece of feedback should be acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Important,
    Suggested,
    Enhancement,
    Positive,
}

const VALID_SEVERITY_STRINGS: &[&str] = &[
    "critical",
    "important",
    "suggested",
    "enhancement",
    "positive",
];

impl Severity {
    /// Return the severity as a lowercase string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Important => "important",
            Self::Suggested => "suggested",
            Self::Enhancement => "enhancement",
            Self::Positive => "positive",
        }
    }

    /// Map the looser vocabulary models tend to produce onto a severity.
    ///
    /// Unknown labels fall back to [`Severity::Suggested`].
    pub fn from_model_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" | "blocker" | "severe" => Self::Critical,
            "important" | "high" | "major" => Self::Important,
            "enhancement" | "low" | "minor" | "nice-to-have" => Self::Enhancement,
            "positive" | "strength" | "good" | "praise" => Self::Positive,
            _ => Self::Suggested,
        }
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Self::Critical),
            "important" => Ok(Self::Important),
            "suggested" => Ok(Self::Suggested),
            "enhancement" => Ok(Self::Enhancement),
            "positive" => Ok(Self::Positive),
            _ => Err(CoreError::Validation(format!(
                "Invalid severity '{s}'. Must be one of: {}",
                VALID_SEVERITY_STRINGS.join(", ")
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

/// One located piece of feedback on an uploaded screenshot.
///
/// Annotations are value objects: components copy them across boundaries
/// and never share a mutable list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Unique within one analysis run.
    pub id: String,
    #[serde(default)]
    pub image_index: usize,
    pub x: f64,
    pub y: f64,
    pub severity: Severity,
    #[serde(default)]
    pub category: String,
    #[serde(alias = "description")]
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Set when a research-validation pass corroborated this annotation's topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_validated: Option<bool>,
    /// Number of external sources the research-validation pass cited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_sources: Option<u32>,
}

impl Annotation {
    pub fn new(
        id: impl Into<String>,
        image_index: usize,
        x: f64,
        y: f64,
        severity: Severity,
        category: impl Into<String>,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            image_index,
            x,
            y,
            severity,
            category: category.into(),
            feedback: feedback.into(),
            title: None,
            research_validated: None,
            research_sources: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Whether both coordinates are finite and inside `[0, 100]`.
    pub fn has_valid_coordinates(&self) -> bool {
        coordinate_in_range(self.x) && coordinate_in_range(self.y)
    }

    /// Title and feedback joined, used by the text heuristics.
    pub fn full_text(&self) -> String {
        match &self.title {
            Some(title) if !title.trim().is_empty() => format!("{title} {}", self.feedback),
            _ => self.feedback.clone(),
        }
    }

    /// Number of whitespace-separated words across title and feedback.
    pub fn word_count(&self) -> usize {
        let title_words = self
            .title
            .as_deref()
            .map(|t| t.split_whitespace().count())
            .unwrap_or(0);
        title_words + self.feedback.split_whitespace().count()
    }
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

fn coordinate_in_range(value: f64) -> bool {
    value.is_finite() && (COORDINATE_MIN..=COORDINATE_MAX).contains(&value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
