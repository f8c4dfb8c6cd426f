//! Process-local analysis store for development and tests.
//!
//! Bounded: once `capacity` records are held, saving a new analysis evicts
//! the oldest one.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use designlens_core::annotation::Annotation;
use designlens_core::error::CoreError;
use designlens_core::quality_control::QualityControlResult;
use designlens_core::store::{AnalysisStore, StoredAnalysis};
use designlens_core::synthesis::SynthesisMetadata;
use designlens_core::types::AnalysisId;
use tokio::sync::RwLock;

/// Records kept when no capacity is given.
pub const DEFAULT_MEMORY_STORE_CAPACITY: usize = 1_000;

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<AnalysisId, StoredAnalysis>,
    /// Insertion order, oldest first.
    order: VecDeque<AnalysisId>,
}

#[derive(Debug)]
pub struct InMemoryAnalysisStore {
    records: RwLock<Records>,
    capacity: usize,
}

impl Default for InMemoryAnalysisStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_STORE_CAPACITY)
    }
}

impl InMemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding at most `capacity` analyses (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(Records::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.by_id.len()
    }
}

#[async_trait]
impl AnalysisStore for InMemoryAnalysisStore {
    async fn save_analysis_result(
        &self,
        analysis_id: AnalysisId,
        final_annotations: &[Annotation],
        quality_report: &QualityControlResult,
        synthesis_metadata: &SynthesisMetadata,
    ) -> Result<(), CoreError> {
        let record = StoredAnalysis {
            analysis_id,
            final_annotations: final_annotations.to_vec(),
            quality_report: quality_report.clone(),
            synthesis_metadata: synthesis_metadata.clone(),
            created_at: Utc::now(),
        };
        let mut records = self.records.write().await;
        if records.by_id.insert(analysis_id, record).is_none() {
            records.order.push_back(analysis_id);
        }
        while records.by_id.len() > self.capacity {
            let Some(oldest) = records.order.pop_front() else {
                break;
            };
            records.by_id.remove(&oldest);
            tracing::debug!(analysis_id = %oldest, "Evicted oldest in-memory analysis");
        }
        Ok(())
    }

    async fn load_analysis_result(
        &self,
        analysis_id: AnalysisId,
    ) -> Result<StoredAnalysis, CoreError> {
        self.records
            .read()
            .await
            .by_id
            .get(&analysis_id)
            .cloned()
            .ok_or(CoreError::NotFound {
                entity: "AnalysisResult",
                id: analysis_id,
            })
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use assert_matches::assert_matches;
    use designlens_core::quality_control::{perform_quality_control, QualityControlOptions};

    use super::*;

    fn metadata() -> SynthesisMetadata {
        SynthesisMetadata {
            primary_model_used: "claude".into(),
            weights: BTreeMap::new(),
            confidence_score: 0.0,
            fallbacks_triggered: Vec::new(),
            quality_score: 0.0,
            states_visited: Vec::new(),
        }
    }

    fn quality() -> QualityControlResult {
        perform_quality_control(&[], &[], None, &QualityControlOptions::default())
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = InMemoryAnalysisStore::new();
        let id = AnalysisId::new_v4();
        let quality = quality();

        store
            .save_analysis_result(id, &[], &quality, &metadata())
            .await
            .unwrap();
        let loaded = store.load_analysis_result(id).await.unwrap();

        assert_eq!(loaded.analysis_id, id);
        assert_eq!(loaded.quality_report, quality);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = InMemoryAnalysisStore::new();
        assert_matches!(
            store.load_analysis_result(AnalysisId::new_v4()).await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn oldest_record_is_evicted_at_capacity() {
        let store = InMemoryAnalysisStore::with_capacity(2);
        let ids: Vec<AnalysisId> = (0..3).map(|_| AnalysisId::new_v4()).collect();
        for id in &ids {
            store
                .save_analysis_result(*id, &[], &quality(), &metadata())
                .await
                .unwrap();
        }

        assert_eq!(store.len().await, 2);
        assert_matches!(
            store.load_analysis_result(ids[0]).await,
            Err(CoreError::NotFound { .. })
        );
        assert!(store.load_analysis_result(ids[1]).await.is_ok());
        assert!(store.load_analysis_result(ids[2]).await.is_ok());
    }

    #[tokio::test]
    async fn resaving_an_id_does_not_evict_others() {
        let store = InMemoryAnalysisStore::with_capacity(2);
        let first = AnalysisId::new_v4();
        let second = AnalysisId::new_v4();
        for id in [first, second, first] {
            store
                .save_analysis_result(id, &[], &quality(), &metadata())
                .await
                .unwrap();
        }

        assert_eq!(store.len().await, 2);
        assert!(store.load_analysis_result(second).await.is_ok());
    }

    #[test]
    fn capacity_is_at_least_one() {
        assert_eq!(InMemoryAnalysisStore::with_capacity(0).capacity(), 1);
        assert_eq!(
            InMemoryAnalysisStore::new().capacity(),
            DEFAULT_MEMORY_STORE_CAPACITY
        );
    }
}
