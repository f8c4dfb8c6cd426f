pub mod analysis;
pub mod orchestrator;
pub mod quality_control;
