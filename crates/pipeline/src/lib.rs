//! Async analysis pipeline.
//!
//! - [`orchestrator`]: the multi-model state machine over the provider adapters.
//! - [`weights`]: the process-wide adaptive weight table.
//! - [`rag`]: retrieval-augmented prompt enhancement.
//! - [`service`]: retrieval, orchestration, quality control and persistence in one call.
//! - [`memory_store`]: an in-process [`AnalysisStore`](designlens_core::store::AnalysisStore).

pub mod memory_store;
pub mod orchestrator;
pub mod rag;
pub mod service;
pub mod weights;

pub use memory_store::InMemoryAnalysisStore;
pub use orchestrator::{OrchestrationOptions, Orchestrator, OrchestratorConfig};
pub use rag::{KeywordRetriever, KnowledgeRetriever, RagContext, RagLayer};
pub use service::{AnalysisReport, AnalysisRequest, AnalysisService};
pub use weights::WeightTable;
