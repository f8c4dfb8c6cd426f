//! Retrieval-augmented prompt enhancement.
//!
//! Retrieved UX guidance is prepended to the analysis prompt, and the
//! retrieval's relevance feeds the quality controller as
//! [`RagQualityInputs`]. Retrieval failures never fail an analysis; they
//! degrade to an empty context.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use designlens_core::quality_control::RagQualityInputs;
use serde::{Deserialize, Serialize};

/// Passages below this relevance are discarded.
pub const MIN_RELEVANCE: f64 = 0.1;

pub const DEFAULT_PASSAGE_LIMIT: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("retrieval failed: {0}")]
    Retrieval(String),
}

/// One entry of a knowledge corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub title: String,
    pub category: String,
    pub content: String,
    pub keywords: Vec<String>,
}

impl KnowledgeEntry {
    pub fn new(
        id: &str,
        title: &str,
        category: &str,
        content: &str,
        keywords: &[&str],
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            category: category.to_string(),
            content: content.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedPassage {
    pub entry_id: String,
    pub title: String,
    pub category: String,
    pub content: String,
    /// In `[0, 1]`.
    pub relevance: f64,
}

#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    /// Up to `limit` passages, most relevant first.
    async fn retrieve(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>, RagError>;
}

// ---------------------------------------------------------------------------
// Keyword retriever
// ---------------------------------------------------------------------------

/// In-memory retriever scoring entries by keyword overlap with the query.
#[derive(Debug, Clone)]
pub struct KeywordRetriever {
    corpus: Vec<KnowledgeEntry>,
}

impl Default for KeywordRetriever {
    fn default() -> Self {
        Self::new(default_corpus())
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(str::to_lowercase)
        .collect()
}

impl KeywordRetriever {
    pub fn new(corpus: Vec<KnowledgeEntry>) -> Self {
        Self { corpus }
    }

    /// Fraction of the entry's keywords present in the query.
    fn relevance(entry: &KnowledgeEntry, query_terms: &HashSet<String>) -> f64 {
        if entry.keywords.is_empty() {
            return 0.0;
        }
        let hits = entry
            .keywords
            .iter()
            .filter(|k| query_terms.contains(&k.to_lowercase()))
            .count();
        hits as f64 / entry.keywords.len() as f64
    }
}

#[async_trait]
impl KnowledgeRetriever for KeywordRetriever {
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedPassage>, RagError> {
        let terms = tokenize(query);
        let mut passages: Vec<RetrievedPassage> = self
            .corpus
            .iter()
            .map(|entry| (entry, Self::relevance(entry, &terms)))
            .filter(|(_, relevance)| *relevance >= MIN_RELEVANCE)
            .map(|(entry, relevance)| RetrievedPassage {
                entry_id: entry.id.clone(),
                title: entry.title.clone(),
                category: entry.category.clone(),
                content: entry.content.clone(),
                relevance,
            })
            .collect();
        passages.sort_by(|a, b| {
            b.relevance
                .total_cmp(&a.relevance)
                .then_with(|| a.entry_id.cmp(&b.entry_id))
        });
        passages.truncate(limit);
        Ok(passages)
    }
}

/// Built-in UX heuristics used when no external knowledge base is configured.
pub fn default_corpus() -> Vec<KnowledgeEntry> {
    vec![
        KnowledgeEntry::new(
            "wcag-contrast",
            "Text contrast",
            "accessibility",
            "Body text needs a contrast ratio of at least 4.5:1 against its background; large \
             text (18pt or 14pt bold) needs 3:1.",
            &["contrast", "color", "text", "accessibility", "wcag", "readability"],
        ),
        KnowledgeEntry::new(
            "touch-targets",
            "Touch target size",
            "accessibility",
            "Interactive targets should be at least 44x44 CSS pixels with enough spacing to avoid \
             accidental taps.",
            &["button", "tap", "touch", "mobile", "target", "accessibility"],
        ),
        KnowledgeEntry::new(
            "visual-hierarchy",
            "Visual hierarchy",
            "layout",
            "One primary action per view; size, weight and position should make the most \
             important element the first thing seen.",
            &["hierarchy", "layout", "primary", "action", "cta", "emphasis"],
        ),
        KnowledgeEntry::new(
            "spacing-grid",
            "Consistent spacing",
            "layout",
            "Spacing should follow a consistent scale (for example multiples of 4 or 8 pixels) so \
             related items group visually.",
            &["spacing", "grid", "alignment", "layout", "padding", "margin"],
        ),
        KnowledgeEntry::new(
            "type-scale",
            "Typographic scale",
            "typography",
            "Limit the interface to a small type scale; body copy should stay at 16px or larger \
             with 1.4-1.6 line height.",
            &["typography", "font", "text", "readability", "heading", "size"],
        ),
        KnowledgeEntry::new(
            "form-labels",
            "Form labels",
            "forms",
            "Every input needs a persistent visible label; placeholders alone disappear on input \
             and fail screen readers.",
            &["form", "input", "label", "field", "placeholder", "checkout"],
        ),
        KnowledgeEntry::new(
            "error-recovery",
            "Error messages",
            "forms",
            "Errors should appear next to the field, explain what went wrong in plain language \
             and how to fix it.",
            &["error", "validation", "form", "message", "feedback", "recovery"],
        ),
        KnowledgeEntry::new(
            "navigation-clarity",
            "Navigation clarity",
            "navigation",
            "Users should always know where they are: highlight the current section and keep \
             primary navigation consistent across pages.",
            &["navigation", "menu", "breadcrumb", "header", "tabs", "wayfinding"],
        ),
        KnowledgeEntry::new(
            "system-status",
            "Visibility of system status",
            "interaction",
            "Provide feedback within 100ms for direct actions and show progress indicators for \
             anything slower than a second.",
            &["loading", "progress", "feedback", "status", "state", "interaction"],
        ),
        KnowledgeEntry::new(
            "content-scannability",
            "Scannable content",
            "content",
            "Front-load key information, keep paragraphs short and use descriptive headings so \
             pages can be scanned.",
            &["content", "copy", "heading", "scan", "paragraph", "microcopy"],
        ),
        KnowledgeEntry::new(
            "color-meaning",
            "Color is not the only signal",
            "color",
            "Do not rely on color alone to convey status; pair it with icons, text or patterns.",
            &["color", "status", "icon", "colorblind", "accessibility", "signal"],
        ),
        KnowledgeEntry::new(
            "checkout-friction",
            "Checkout friction",
            "conversion",
            "Offer guest checkout, show total cost early and keep the number of required fields \
             to a minimum.",
            &["checkout", "cart", "payment", "conversion", "form", "ecommerce"],
        ),
    ]
}

// ---------------------------------------------------------------------------
// Layer
// ---------------------------------------------------------------------------

/// Retrieved context for one prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagContext {
    pub context_text: String,
    pub passages: Vec<RetrievedPassage>,
    /// `None` when nothing relevant was retrieved.
    pub quality: Option<RagQualityInputs>,
}

impl RagContext {
    pub fn empty() -> Self {
        Self {
            context_text: String::new(),
            passages: Vec::new(),
            quality: None,
        }
    }

    fn from_passages(passages: Vec<RetrievedPassage>) -> Self {
        if passages.is_empty() {
            return Self::empty();
        }
        let n = passages.len() as f64;
        let mean = passages.iter().map(|p| p.relevance).sum::<f64>() / n;
        let max = passages.iter().map(|p| p.relevance).fold(0.0, f64::max);
        let context_text = passages
            .iter()
            .map(|p| format!("- {} ({}): {}", p.title, p.category, p.content))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            context_text,
            passages,
            quality: Some(RagQualityInputs {
                rag_quality_score: mean.clamp(0.0, 1.0),
                hallucination_risk: (1.0 - max).clamp(0.0, 1.0),
            }),
        }
    }

    /// The prompt with the retrieved guidance prepended.
    pub fn apply(&self, prompt: &str) -> String {
        if self.passages.is_empty() {
            return prompt.to_string();
        }
        format!(
            "Reference UX guidance relevant to this request:\n{}\n\n\
             Ground every finding in what is visible in the screenshots.\n\n{prompt}",
            self.context_text
        )
    }
}

#[derive(Clone)]
pub struct RagLayer {
    retriever: Arc<dyn KnowledgeRetriever>,
    limit: usize,
}

impl RagLayer {
    pub fn new(retriever: Arc<dyn KnowledgeRetriever>) -> Self {
        Self {
            retriever,
            limit: DEFAULT_PASSAGE_LIMIT,
        }
    }

    /// Maximum passages retrieved per prompt.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Retrieve context for `prompt`. Failures yield an empty context.
    pub async fn enhance(&self, prompt: &str) -> RagContext {
        match self.retriever.retrieve(prompt, self.limit).await {
            Ok(passages) => {
                let context = RagContext::from_passages(passages);
                tracing::debug!(passages = context.passages.len(), "Retrieved prompt context");
                context
            }
            Err(e) => {
                tracing::warn!(error = %e, "Retrieval failed, continuing without context");
                RagContext::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    #[async_trait]
    impl KnowledgeRetriever for Broken {
        async fn retrieve(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<RetrievedPassage>, RagError> {
            Err(RagError::Retrieval("index offline".into()))
        }
    }

    #[tokio::test]
    async fn ranks_by_keyword_overlap() {
        let retriever = KeywordRetriever::default();
        let passages = retriever
            .retrieve("Check text contrast and color accessibility against WCAG", 3)
            .await
            .unwrap();
        assert!(!passages.is_empty());
        assert_eq!(passages[0].entry_id, "wcag-contrast");
        assert!(passages.len() <= 3);
        assert!(passages
            .windows(2)
            .all(|w| w[0].relevance >= w[1].relevance));
    }

    #[tokio::test]
    async fn unrelated_query_retrieves_nothing() {
        let passages = KeywordRetriever::default().retrieve("zzz qqq", 4).await.unwrap();
        assert!(passages.is_empty());
    }

    #[tokio::test]
    async fn enhance_builds_quality_inputs() {
        let layer = RagLayer::new(Arc::new(KeywordRetriever::default()));
        let context = layer.enhance("Review the checkout form labels and payment fields").await;
        let quality = context.quality.expect("quality inputs");
        assert!(quality.rag_quality_score > 0.0);
        assert!(quality.rag_quality_score <= 1.0);
        assert!(quality.hallucination_risk < 1.0);
        let prompt = context.apply("Audit the checkout");
        assert!(prompt.starts_with("Reference UX guidance"));
        assert!(prompt.ends_with("Audit the checkout"));
    }

    #[tokio::test]
    async fn limit_caps_retrieved_passages() {
        let query = "Review the checkout form labels and payment fields";
        let wide = RagLayer::new(Arc::new(KeywordRetriever::default()));
        assert!(wide.enhance(query).await.passages.len() > 1);

        let narrow = RagLayer::new(Arc::new(KeywordRetriever::default())).with_limit(1);
        let context = narrow.enhance(query).await;
        assert_eq!(context.passages.len(), 1);
        assert_eq!(context.context_text.lines().count(), 1);
    }

    #[tokio::test]
    async fn retrieval_errors_degrade_to_no_context() {
        let layer = RagLayer::new(Arc::new(Broken));
        let context = layer.enhance("anything").await;
        assert_eq!(context, RagContext::empty());
        assert_eq!(context.apply("prompt"), "prompt");
    }
}
