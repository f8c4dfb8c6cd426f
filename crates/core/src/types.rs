/// Analyses are keyed by a random UUID assigned when the run starts.
pub type AnalysisId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
