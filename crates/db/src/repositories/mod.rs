//! Data access repositories, one per table.

pub mod analysis_result_repo;

pub use analysis_result_repo::AnalysisResultRepo;
