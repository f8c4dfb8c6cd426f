//! Provider credentials and endpoints, loaded from the environment.

use std::time::Duration;

pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";

pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_PERPLEXITY_MODEL: &str = "sonar";

pub const CLAUDE_TIMEOUT: Duration = Duration::from_secs(35);
pub const OPENAI_TIMEOUT: Duration = Duration::from_secs(30);
pub const PERPLEXITY_TIMEOUT: Duration = Duration::from_secs(15);

/// Endpoint settings for one vendor.
#[derive(Debug, Clone)]
pub struct VendorSettings {
    /// `None` means every call fails with an authentication error.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl VendorSettings {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn from_env(prefix: &str, default_base_url: &str, default_model: &str) -> Self {
        let var = |suffix: &str| std::env::var(format!("{prefix}_{suffix}")).ok();
        Self::new(
            var("API_KEY"),
            var("BASE_URL").unwrap_or_else(|| default_base_url.into()),
            var("MODEL").unwrap_or_else(|| default_model.into()),
        )
    }
}

/// Settings for all three vendors.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub claude: VendorSettings,
    pub openai: VendorSettings,
    pub perplexity: VendorSettings,
}

impl ProviderSettings {
    /// Load from environment variables.
    ///
    /// | Env var | Default |
    /// |---------|---------|
    /// | `ANTHROPIC_API_KEY` | none |
    /// | `ANTHROPIC_BASE_URL` | `https://api.anthropic.com` |
    /// | `ANTHROPIC_MODEL` | `claude-3-5-sonnet-20241022` |
    /// | `OPENAI_API_KEY` | none |
    /// | `OPENAI_BASE_URL` | `https://api.openai.com` |
    /// | `OPENAI_MODEL` | `gpt-4o` |
    /// | `PERPLEXITY_API_KEY` | none |
    /// | `PERPLEXITY_BASE_URL` | `https://api.perplexity.ai` |
    /// | `PERPLEXITY_MODEL` | `sonar` |
    pub fn from_env() -> Self {
        Self {
            claude: VendorSettings::from_env(
                "ANTHROPIC",
                DEFAULT_ANTHROPIC_BASE_URL,
                DEFAULT_CLAUDE_MODEL,
            ),
            openai: VendorSettings::from_env(
                "OPENAI",
                DEFAULT_OPENAI_BASE_URL,
                DEFAULT_OPENAI_MODEL,
            ),
            perplexity: VendorSettings::from_env(
                "PERPLEXITY",
                DEFAULT_PERPLEXITY_BASE_URL,
                DEFAULT_PERPLEXITY_MODEL,
            ),
        }
    }
}
