use designlens_core::model_response::{categorize_error, ErrorCategory, ProviderName};

/// Errors raised inside a provider adapter before they are folded into a
/// failed [`ModelResponse`](designlens_core::model_response::ModelResponse).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No API key configured for the provider.
    #[error("missing API key for {0}")]
    MissingApiKey(ProviderName),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("network request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The vendor returned a non-2xx status code.
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: ProviderName,
        status: u16,
        body: String,
    },

    /// The call exceeded its hard deadline.
    #[error("{provider} request timed out after {after_ms} ms")]
    Timeout {
        provider: ProviderName,
        after_ms: u64,
    },

    /// An uploaded image failed pre-flight validation.
    #[error("invalid image {index}: {reason}")]
    InvalidImage { index: usize, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The vendor answered but its content could not be turned into annotations.
    #[error("unparseable model output: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Category used when the error is reported in a failed response.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingApiKey(_) => ErrorCategory::Authentication,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Request(e) if e.is_timeout() => ErrorCategory::Timeout,
            Self::Request(e) if e.is_connect() => ErrorCategory::Network,
            Self::InvalidImage { .. } => ErrorCategory::ImageProcessing,
            other => categorize_error(&other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_categorize_by_status_and_body() {
        let unauthorized = ProviderError::Api {
            provider: ProviderName::Claude,
            status: 401,
            body: "invalid x-api-key".into(),
        };
        assert_eq!(unauthorized.category(), ErrorCategory::Authentication);

        let limited = ProviderError::Api {
            provider: ProviderName::Openai,
            status: 429,
            body: "Rate limit reached".into(),
        };
        assert_eq!(limited.category(), ErrorCategory::RateLimit);

        let bad_image = ProviderError::Api {
            provider: ProviderName::Claude,
            status: 400,
            body: "Could not process image".into(),
        };
        assert_eq!(bad_image.category(), ErrorCategory::ImageProcessing);
    }

    #[test]
    fn local_errors_have_fixed_categories() {
        assert_eq!(
            ProviderError::MissingApiKey(ProviderName::Perplexity).category(),
            ErrorCategory::Authentication
        );
        let timeout = ProviderError::Timeout {
            provider: ProviderName::Claude,
            after_ms: 35_000,
        };
        assert_eq!(timeout.category(), ErrorCategory::Timeout);
        let image = ProviderError::InvalidImage {
            index: 0,
            reason: "too short".into(),
        };
        assert_eq!(image.category(), ErrorCategory::ImageProcessing);
        assert_eq!(
            ProviderError::InvalidRequest("prompt must not be empty".into()).category(),
            ErrorCategory::Unknown
        );
    }
}
