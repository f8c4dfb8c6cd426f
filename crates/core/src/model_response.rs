//! Uniform provider call results and the shared error taxonomy.
//!
//! Every provider adapter reduces its vendor-specific response (or failure)
//! to a [`ModelResponse`]. Failed responses are built through
//! [`ModelResponse::failed`], which is the only way to get `success = false`,
//! so a failure can never carry annotations or a non-zero confidence.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;

// ---------------------------------------------------------------------------
// Provider names
// ---------------------------------------------------------------------------

/// External AI vendors known to the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderName {
    Claude,
    Openai,
    Perplexity,
    Vision,
}

impl ProviderName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Openai => "openai",
            Self::Perplexity => "perplexity",
            Self::Vision => "vision",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Flat error taxonomy shared by every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    Timeout,
    RateLimit,
    ImageProcessing,
    Network,
    /// Annotation data out of contract. Never produced by adapters.
    Validation,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Timeout => "timeout",
            Self::RateLimit => "rate_limit",
            Self::ImageProcessing => "image_processing",
            Self::Network => "network",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
        }
    }
}

/// Keyword table checked in order; the first category with a matching
/// keyword wins.
const CATEGORY_KEYWORDS: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::Authentication,
        &["401", "403", "unauthorized", "api key", "authentication", "forbidden"],
    ),
    (ErrorCategory::Timeout, &["timeout", "timed out", "deadline"]),
    (
        ErrorCategory::RateLimit,
        &["429", "rate limit", "quota", "overloaded", "too many requests"],
    ),
    (
        ErrorCategory::ImageProcessing,
        &["image", "media type", "decode", "base64"],
    ),
    (
        ErrorCategory::Network,
        &["network", "connection", "dns", "connect", "unreachable", "reset"],
    ),
];

/// Categorize a raw error message by case-insensitive keyword match.
///
/// Deterministic: the same message always yields the same category.
pub fn categorize_error(message: &str) -> ErrorCategory {
    let lowered = message.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(ErrorCategory::Unknown)
}

// ---------------------------------------------------------------------------
// Image payloads
// ---------------------------------------------------------------------------

/// One uploaded screenshot as handed to the providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    /// Base64-encoded image bytes (no `data:` prefix).
    pub encoded_payload: String,
    pub mime_type: String,
    #[serde(default)]
    pub source_url: String,
}

// ---------------------------------------------------------------------------
// ModelResponse
// ---------------------------------------------------------------------------

/// Text output of a research-validation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchFindings {
    pub summary: String,
    #[serde(default)]
    pub citations: Vec<String>,
}

/// The uniform result of one provider call attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    pub provider_name: ProviderName,
    pub success: bool,
    pub annotations: Vec<Annotation>,
    pub confidence: f64,
    pub processing_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research: Option<ResearchFindings>,
}

impl ModelResponse {
    /// A successful call. `confidence` is clamped to `[0, 1]`.
    pub fn succeeded(
        provider_name: ProviderName,
        annotations: Vec<Annotation>,
        confidence: f64,
        processing_time_ms: u64,
    ) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            provider_name,
            success: true,
            annotations,
            confidence,
            processing_time_ms,
            error: None,
            error_category: None,
            research: None,
        }
    }

    /// A failed call: no annotations and zero confidence.
    pub fn failed(
        provider_name: ProviderName,
        error: impl Into<String>,
        error_category: ErrorCategory,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            provider_name,
            success: false,
            annotations: Vec::new(),
            confidence: 0.0,
            processing_time_ms,
            error: Some(error.into()),
            error_category: Some(error_category),
            research: None,
        }
    }

    /// Attach research findings to a successful response.
    pub fn with_research(mut self, findings: ResearchFindings) -> Self {
        if self.success {
            self.research = Some(findings);
        }
        self
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
