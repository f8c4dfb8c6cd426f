use std::net::SocketAddr;
use std::sync::Arc;

use designlens_core::store::AnalysisStore;
use designlens_pipeline::{
    AnalysisService, InMemoryAnalysisStore, KeywordRetriever, Orchestrator, OrchestratorConfig,
    RagLayer, WeightTable,
};
use designlens_providers::{ProviderSet, ProviderSettings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use designlens_api::config::ServerConfig;
use designlens_api::router::build_app_router;
use designlens_api::state::AppState;

const DEFAULT_LOG_FILTER: &str = "designlens_api=debug,designlens_pipeline=debug,\
                                  designlens_providers=info,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Analysis store ---
    let store: Arc<dyn AnalysisStore> = match &config.database_url {
        Some(database_url) => {
            let pool = designlens_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            designlens_db::health_check(&pool)
                .await
                .expect("Database health check failed");

            designlens_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(designlens_db::PgAnalysisStore::new(pool))
        }
        None => {
            tracing::warn!(
                capacity = config.memory_store_capacity,
                "DATABASE_URL not set, analysis results are kept in memory"
            );
            let store = InMemoryAnalysisStore::with_capacity(config.memory_store_capacity);
            Arc::new(store)
        }
    };

    // --- Providers and orchestration ---
    let providers =
        ProviderSet::from_settings(reqwest::Client::new(), ProviderSettings::from_env());
    let orchestrator_config = OrchestratorConfig::from_env();
    tracing::info!(
        adaptive_weights = orchestrator_config.adaptive_weights,
        "Orchestrator configured"
    );
    let orchestrator = Orchestrator::new(
        providers.primary,
        providers.secondary,
        Arc::new(WeightTable::default()),
        orchestrator_config,
    )
    .with_research(providers.research);

    let rag = RagLayer::new(Arc::new(KeywordRetriever::default()))
        .with_limit(config.rag_passage_limit);
    let service = AnalysisService::new(orchestrator, store, config.quality.clone())
        .with_rag(rag);

    // --- App state ---
    let state = AppState {
        service: Arc::new(service),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
