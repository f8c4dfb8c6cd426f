//! The generic adapter contract shared by every vendor.
//!
//! A concrete adapter only implements [`VisionProvider::invoke`], which may
//! fail freely. [`call`] wraps it with validation, the hard timeout and
//! error categorization, and always returns a [`ModelResponse`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use designlens_core::annotation::Annotation;
use designlens_core::model_response::{ImagePayload, ModelResponse, ProviderName, ResearchFindings};

use crate::error::ProviderError;
use crate::validation::validate_request;

/// Per-call overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallConfig {
    /// Overrides the adapter's default timeout.
    pub timeout_ms: Option<u64>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

/// What an adapter extracted from a successful vendor reply.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProviderOutput {
    pub annotations: Vec<Annotation>,
    /// The model's self-reported confidence.
    pub confidence: f64,
    pub research: Option<ResearchFindings>,
}

/// One external AI vendor.
///
/// Implementations hold no per-call state and are shared across
/// concurrent orchestrations.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    fn name(&self) -> ProviderName;

    fn default_timeout(&self) -> Duration;

    /// Perform the vendor request. Inputs are already validated.
    async fn invoke(
        &self,
        images: &[ImagePayload],
        prompt: &str,
        config: &CallConfig,
    ) -> Result<ProviderOutput, ProviderError>;
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Call a provider. Never fails: every error becomes a failed response.
pub async fn call(
    provider: &dyn VisionProvider,
    images: &[ImagePayload],
    prompt: &str,
    config: &CallConfig,
) -> ModelResponse {
    let name = provider.name();
    let started = Instant::now();

    if let Err(e) = validate_request(images, prompt) {
        tracing::warn!(provider = %name, error = %e, "Provider request rejected before sending");
        return ModelResponse::failed(name, e.to_string(), e.category(), elapsed_ms(started));
    }

    let limit = config
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| provider.default_timeout());

    let outcome = match tokio::time::timeout(limit, provider.invoke(images, prompt, config)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            provider: name,
            after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    };
    let processing_time_ms = elapsed_ms(started);

    match outcome {
        Ok(output) => {
            tracing::info!(
                provider = %name,
                annotations = output.annotations.len(),
                confidence = output.confidence,
                processing_time_ms,
                "Provider call succeeded"
            );
            let response = ModelResponse::succeeded(
                name,
                output.annotations,
                output.confidence,
                processing_time_ms,
            );
            match output.research {
                Some(findings) => response.with_research(findings),
                None => response,
            }
        }
        Err(e) => {
            let category = e.category();
            tracing::warn!(
                provider = %name,
                category = category.as_str(),
                error = %e,
                processing_time_ms,
                "Provider call failed"
            );
            ModelResponse::failed(name, e.to_string(), category, processing_time_ms)
        }
    }
}

// ---- shared HTTP helpers ----

/// Return the response unchanged on a 2xx status, or an
/// [`ProviderError::Api`] carrying the status and body text.
pub(crate) async fn ensure_success(
    provider: ProviderName,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Parse a successful JSON response body into the expected type.
pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
    provider: ProviderName,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let response = ensure_success(provider, response).await?;
    Ok(response.json::<T>().await?)
}

/// Fail fast when no API key is configured.
pub(crate) fn require_key(
    provider: ProviderName,
    key: Option<&str>,
) -> Result<&str, ProviderError> {
    key.ok_or(ProviderError::MissingApiKey(provider))
}
