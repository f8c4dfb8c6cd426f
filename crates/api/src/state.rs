use std::sync::Arc;

use designlens_pipeline::AnalysisService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Orchestration, quality control and result storage.
    pub service: Arc<AnalysisService>,
}
