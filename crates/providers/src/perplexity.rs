//! Perplexity adapter used for research validation.
//!
//! Perplexity never sees the screenshots and never produces annotations;
//! its answer and citations come back as [`ResearchFindings`].

use std::time::Duration;

use async_trait::async_trait;
use designlens_core::model_response::{ImagePayload, ProviderName, ResearchFindings};

use crate::adapter::{parse_response, require_key, CallConfig, ProviderOutput, VisionProvider};
use crate::error::ProviderError;
use crate::openai::ChatCompletion;
use crate::parsing::DEFAULT_REPORTED_CONFIDENCE;
use crate::settings::{VendorSettings, PERPLEXITY_TIMEOUT};

const DEFAULT_MAX_TOKENS: u32 = 1024;

const RESEARCH_SYSTEM_PROMPT: &str = "You are a UX research assistant. Answer with established, \
citable usability and accessibility guidance (WCAG, Nielsen heuristics, platform guidelines). \
Name the categories the guidance applies to, such as accessibility, layout, typography, color, \
navigation, content and interaction.";

#[derive(Clone)]
pub struct PerplexityProvider {
    client: reqwest::Client,
    settings: VendorSettings,
}

impl PerplexityProvider {
    pub fn new(client: reqwest::Client, settings: VendorSettings) -> Self {
        Self { client, settings }
    }

    fn research_prompt(prompt: &str, image_count: usize) -> String {
        format!(
            "A UX audit of {image_count} interface screenshot(s) was requested \
             with these instructions:\n\n\
             {prompt}\n\n\
             Summarize the current best-practice guidance an expert reviewer \
             should check these screens against."
        )
    }

    fn request_body(prompt: &str, config: &CallConfig, model: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": model,
            "max_tokens": config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": [
                { "role": "system", "content": RESEARCH_SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
        });
        if let Some(temperature) = config.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        body
    }
}

#[async_trait]
impl VisionProvider for PerplexityProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Perplexity
    }

    fn default_timeout(&self) -> Duration {
        PERPLEXITY_TIMEOUT
    }

    async fn invoke(
        &self,
        images: &[ImagePayload],
        prompt: &str,
        config: &CallConfig,
    ) -> Result<ProviderOutput, ProviderError> {
        let api_key = require_key(self.name(), self.settings.api_key.as_deref())?;
        let research_prompt = Self::research_prompt(prompt, images.len());
        let body = Self::request_body(&research_prompt, config, &self.settings.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.settings.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let mut completion: ChatCompletion = parse_response(self.name(), response).await?;
        let citations = std::mem::take(&mut completion.citations);
        let summary = completion.into_text()?;

        Ok(ProviderOutput {
            annotations: Vec::new(),
            confidence: DEFAULT_REPORTED_CONFIDENCE,
            research: Some(ResearchFindings { summary, citations }),
        })
    }
}
