#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use designlens_core::quality_control::QualityControlOptions;
use designlens_pipeline::{
    AnalysisService, InMemoryAnalysisStore, KeywordRetriever, Orchestrator, OrchestratorConfig,
    RagLayer, WeightTable,
};
use designlens_providers::{ProviderSet, ProviderSettings, VendorSettings};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use designlens_api::config::ServerConfig;
use designlens_api::router::build_app_router;
use designlens_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_body_bytes: 10 * 1024 * 1024,
        database_url: None,
        memory_store_capacity: 100,
        rag_passage_limit: 4,
        quality: QualityControlOptions::default(),
    }
}

/// Build the full application router against vendors at `base_url`.
///
/// With `api_key = None` every provider call fails before any network
/// traffic, which is enough for tests that only exercise the HTTP surface.
pub fn build_test_app(base_url: &str, api_key: Option<&str>) -> Router {
    build_test_app_with_config(base_url, api_key, test_config())
}

/// Like [`build_test_app`], with the store and retrieval sized from `config`.
pub fn build_test_app_with_config(
    base_url: &str,
    api_key: Option<&str>,
    config: ServerConfig,
) -> Router {
    let vendor = |model: &str| VendorSettings::new(api_key.map(str::to_string), base_url, model);
    let providers = ProviderSet::from_settings(
        reqwest::Client::new(),
        ProviderSettings {
            claude: vendor("claude"),
            openai: vendor("gpt-4o"),
            perplexity: vendor("sonar"),
        },
    );
    let orchestrator = Orchestrator::new(
        providers.primary,
        providers.secondary,
        Arc::new(WeightTable::default()),
        OrchestratorConfig::default(),
    )
    .with_research(providers.research);

    let store = InMemoryAnalysisStore::with_capacity(config.memory_store_capacity);
    let rag = RagLayer::new(Arc::new(KeywordRetriever::default()))
        .with_limit(config.rag_passage_limit);
    let service = AnalysisService::new(orchestrator, Arc::new(store), config.quality.clone())
        .with_rag(rag);

    let state = AppState {
        service: Arc::new(service),
    };
    build_app_router(state, &config)
}

/// An app whose providers have no credentials.
pub fn build_offline_app() -> Router {
    build_test_app("http://127.0.0.1:9", None)
}

/// A base64 PNG screenshot that passes payload validation.
pub fn png_image_json() -> Value {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(400, 7);
    serde_json::json!({
        "encodedPayload": STANDARD.encode(bytes),
        "mimeType": "image/png",
        "sourceUrl": "https://cdn.example.com/signup.png",
    })
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
