//! Anthropic Messages API adapter (primary analysis provider).

use std::time::Duration;

use async_trait::async_trait;
use designlens_core::model_response::{ImagePayload, ProviderName};
use serde::Deserialize;

use crate::adapter::{parse_response, require_key, CallConfig, ProviderOutput, VisionProvider};
use crate::error::ProviderError;
use crate::parsing::parse_annotations;
use crate::settings::{VendorSettings, CLAUDE_TIMEOUT};
use crate::validation::{normalize_mime_type, strip_data_uri};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// HTTP client for the Claude vision model.
#[derive(Clone)]
pub struct ClaudeProvider {
    client: reqwest::Client,
    settings: VendorSettings,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ClaudeProvider {
    pub fn new(client: reqwest::Client, settings: VendorSettings) -> Self {
        Self { client, settings }
    }

    fn request_body(
        images: &[ImagePayload],
        prompt: &str,
        config: &CallConfig,
        model: &str,
    ) -> serde_json::Value {
        let mut content: Vec<serde_json::Value> = images
            .iter()
            .map(|image| {
                serde_json::json!({
                    "type": "image",
                    "source": {
                        "type": "base64",
                        "media_type": normalize_mime_type(&image.mime_type),
                        "data": strip_data_uri(&image.encoded_payload),
                    }
                })
            })
            .collect();
        content.push(serde_json::json!({ "type": "text", "text": prompt }));

        let mut body = serde_json::json!({
            "model": model,
            "max_tokens": config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "messages": [{ "role": "user", "content": content }],
        });
        if let Some(temperature) = config.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        body
    }
}

#[async_trait]
impl VisionProvider for ClaudeProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Claude
    }

    fn default_timeout(&self) -> Duration {
        CLAUDE_TIMEOUT
    }

    async fn invoke(
        &self,
        images: &[ImagePayload],
        prompt: &str,
        config: &CallConfig,
    ) -> Result<ProviderOutput, ProviderError> {
        let api_key = require_key(self.name(), self.settings.api_key.as_deref())?;
        let body = Self::request_body(images, prompt, config, &self.settings.model);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.settings.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;
        let reply: MessagesResponse = parse_response(self.name(), response).await?;

        let text: String = reply
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        let parsed = parse_annotations(self.name(), &text)?;
        Ok(ProviderOutput {
            annotations: parsed.annotations,
            confidence: parsed.reported_confidence,
            research: None,
        })
    }
}
