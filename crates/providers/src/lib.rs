//! HTTP adapters for the external AI vendors.
//!
//! Every adapter implements [`VisionProvider`]; callers go through
//! [`call`], which validates inputs, enforces the hard timeout and
//! folds failures into a categorized `ModelResponse`.

pub mod adapter;
pub mod claude;
pub mod error;
pub mod openai;
pub mod parsing;
pub mod perplexity;
pub mod settings;
pub mod validation;

use std::sync::Arc;

pub use adapter::{call, CallConfig, ProviderOutput, VisionProvider};
pub use claude::ClaudeProvider;
pub use error::ProviderError;
pub use openai::OpenAiProvider;
pub use perplexity::PerplexityProvider;
pub use settings::{ProviderSettings, VendorSettings};

/// The three configured adapters, sharing one HTTP connection pool.
pub struct ProviderSet {
    pub primary: Arc<dyn VisionProvider>,
    pub secondary: Arc<dyn VisionProvider>,
    pub research: Arc<dyn VisionProvider>,
}

impl ProviderSet {
    pub fn from_settings(client: reqwest::Client, settings: ProviderSettings) -> Self {
        Self {
            primary: Arc::new(ClaudeProvider::new(client.clone(), settings.claude)),
            secondary: Arc::new(OpenAiProvider::new(client.clone(), settings.openai)),
            research: Arc::new(PerplexityProvider::new(client, settings.perplexity)),
        }
    }
}
