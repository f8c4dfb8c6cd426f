use designlens_core::quality_control::QualityControlOptions;
use designlens_pipeline::memory_store::DEFAULT_MEMORY_STORE_CAPACITY;
use designlens_pipeline::rag::DEFAULT_PASSAGE_LIMIT;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `90`). Must exceed the
    /// slowest provider timeout plus quality control.
    pub request_timeout_secs: u64,
    /// Maximum request body size in bytes (default: 50 MiB).
    pub max_body_bytes: usize,
    /// PostgreSQL URL. Results are kept in memory when unset.
    pub database_url: Option<String>,
    /// Analyses kept by the in-memory store before the oldest is evicted.
    pub memory_store_capacity: usize,
    /// Knowledge passages prepended to a prompt when retrieval is requested.
    pub rag_passage_limit: usize,
    /// Default quality control options for every analysis.
    pub quality: QualityControlOptions,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `HOST`                      | `0.0.0.0`               |
    /// | `PORT`                      | `3000`                  |
    /// | `CORS_ORIGINS`              | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`      | `90`                    |
    /// | `MAX_BODY_BYTES`            | `52428800`              |
    /// | `DATABASE_URL`              | unset (in-memory store) |
    /// | `MEMORY_STORE_CAPACITY`     | `1000`                  |
    /// | `RAG_PASSAGE_LIMIT`         | `4`                     |
    /// | `QUALITY_MINIMUM_THRESHOLD` | `0.7`                   |
    ///
    /// Panics on unparseable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 90);
        let max_body_bytes: usize = env_or("MAX_BODY_BYTES", 50 * 1024 * 1024);

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let memory_store_capacity: usize =
            env_or("MEMORY_STORE_CAPACITY", DEFAULT_MEMORY_STORE_CAPACITY);
        let rag_passage_limit: usize = env_or("RAG_PASSAGE_LIMIT", DEFAULT_PASSAGE_LIMIT);

        let defaults = QualityControlOptions::default();
        let quality = QualityControlOptions {
            minimum_quality_threshold: env_or(
                "QUALITY_MINIMUM_THRESHOLD",
                defaults.minimum_quality_threshold,
            ),
            ..defaults
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_body_bytes,
            database_url,
            memory_store_capacity,
            rag_passage_limit,
            quality,
        }
    }
}
