//! OpenAI Chat Completions adapter (GPT-4o, secondary analysis provider).

use std::time::Duration;

use async_trait::async_trait;
use designlens_core::model_response::{ImagePayload, ProviderName};
use serde::Deserialize;

use crate::adapter::{parse_response, require_key, CallConfig, ProviderOutput, VisionProvider};
use crate::error::ProviderError;
use crate::parsing::parse_annotations;
use crate::settings::{VendorSettings, OPENAI_TIMEOUT};
use crate::validation::{normalize_mime_type, strip_data_uri};

const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    settings: VendorSettings,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletion {
    /// Text of the first choice.
    pub(crate) fn into_text(self) -> Result<String, ProviderError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("completion has no content".into()))
    }
}

impl OpenAiProvider {
    pub fn new(client: reqwest::Client, settings: VendorSettings) -> Self {
        Self { client, settings }
    }

    fn request_body(
        images: &[ImagePayload],
        prompt: &str,
        config: &CallConfig,
        model: &str,
    ) -> serde_json::Value {
        let mut content = vec![serde_json::json!({ "type": "text", "text": prompt })];
        content.extend(images.iter().map(|image| {
            serde_json::json!({
                "type": "image_url",
                "image_url": {
                    "url": format!(
                        "data:{};base64,{}",
                        normalize_mime_type(&image.mime_type),
                        strip_data_uri(&image.encoded_payload)
                    ),
                    "detail": "high",
                }
            })
        }));

        let mut body = serde_json::json!({
            "model": model,
            "max_tokens": config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "response_format": { "type": "json_object" },
            "messages": [{ "role": "user", "content": content }],
        });
        if let Some(temperature) = config.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        body
    }
}

#[async_trait]
impl VisionProvider for OpenAiProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Openai
    }

    fn default_timeout(&self) -> Duration {
        OPENAI_TIMEOUT
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
            .post(format!("{}/v1/chat/completions", self.settings.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let completion: ChatCompletion = parse_response(self.name(), response).await?;

        let parsed = parse_annotations(self.name(), &completion.into_text()?)?;
        Ok(ProviderOutput {
            annotations: parsed.annotations,
            confidence: parsed.reported_confidence,
            research: None,
        })
    }
}
