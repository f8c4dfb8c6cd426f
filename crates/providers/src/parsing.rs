//! Turning free-form model text into annotations.
//!
//! Vision models are asked for JSON but routinely wrap it in markdown
//! fences or prose. The parser accepts either an object with an
//! `annotations` array (plus optional `confidence`) or a bare array.

use std::sync::LazyLock;

use designlens_core::annotation::{Annotation, Severity};
use designlens_core::model_response::ProviderName;
use regex::Regex;
use serde::Deserialize;

use crate::error::ProviderError;

/// Self-reported confidence assumed when the model omits one.
pub const DEFAULT_REPORTED_CONFIDENCE: f64 = 0.8;

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid regex"));

/// Annotations plus the model's own confidence figure.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnnotations {
    pub annotations: Vec<Annotation>,
    pub reported_confidence: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnnotation {
    x: f64,
    y: f64,
    #[serde(default, alias = "image_index", alias = "image")]
    image_index: Option<usize>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default, alias = "type")]
    category: Option<String>,
    #[serde(default, alias = "description", alias = "comment")]
    feedback: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnnotationEnvelope {
    #[serde(default)]
    annotations: Vec<serde_json::Value>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Find the JSON document inside a model reply.
fn extract_json(text: &str) -> Option<&str> {
    if let Some(inner) = CODE_FENCE_RE.captures(text).and_then(|c| c.get(1)) {
        let inner = inner.as_str().trim();
        if !inner.is_empty() {
            return Some(inner);
        }
    }

    let start = text.find(['{', '['])?;
    let closing = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closing)?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model reply into annotations with ids `"{provider}-{n}"`.
///
/// Entries without numeric coordinates are skipped. Coordinates are kept
/// as reported; range checks belong to the quality controller.
pub fn parse_annotations(
    provider: ProviderName,
    text: &str,
) -> Result<ParsedAnnotations, ProviderError> {
    let json = extract_json(text)
        .ok_or_else(|| ProviderError::InvalidResponse("no JSON found in model output".into()))?;
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| ProviderError::InvalidResponse(format!("malformed JSON: {e}")))?;

    let (items, confidence) = match value {
        serde_json::Value::Array(items) => (items, None),
        object @ serde_json::Value::Object(_) => {
            let envelope: AnnotationEnvelope = serde_json::from_value(object)
                .map_err(|e| ProviderError::InvalidResponse(format!("unexpected shape: {e}")))?;
            (envelope.annotations, envelope.confidence)
        }
        other => {
            return Err(ProviderError::InvalidResponse(format!(
                "expected an object or array, got {other}"
            )))
        }
    };

    let mut annotations = Vec::with_capacity(items.len());
    for item in items {
        let raw: RawAnnotation = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(provider = %provider, error = %e, "Skipping malformed annotation");
                continue;
            }
        };
        let severity = raw
            .severity
            .as_deref()
            .map(Severity::from_model_label)
            .unwrap_or(Severity::Suggested);
        let mut annotation = Annotation::new(
            format!("{provider}-{}", annotations.len() + 1),
            raw.image_index.unwrap_or(0),
            raw.x,
            raw.y,
            severity,
            raw.category.unwrap_or_default(),
            raw.feedback.unwrap_or_default(),
        );
        if let Some(title) = raw.title.filter(|t| !t.trim().is_empty()) {
            annotation = annotation.with_title(title);
        }
        annotations.push(annotation);
    }

    Ok(ParsedAnnotations {
        annotations,
        reported_confidence: confidence.unwrap_or(DEFAULT_REPORTED_CONFIDENCE),
    })
}
