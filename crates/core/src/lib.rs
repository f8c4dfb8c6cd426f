//! Domain logic for multi-model UX analysis.
//!
//! This crate has no I/O. It provides:
//!
//! - [`annotation`]: the annotation record and coordinate rules.
//! - [`model_response`]: uniform provider results and the error taxonomy.
//! - [`scoring`]: annotation-set quality score and count-based confidence.
//! - [`synthesis`]: acceptance, merge and weight policy used by the orchestrator.
//! - [`grounding`]: visual grounding and hallucination heuristics.
//! - [`quality_control`]: the multi-stage quality controller.
//! - [`store`]: the persistence trait implemented by the store crates.

pub mod annotation;
pub mod error;
pub mod grounding;
pub mod model_response;
pub mod quality_control;
pub mod scoring;
pub mod store;
pub mod synthesis;
pub mod types;
