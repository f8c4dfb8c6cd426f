//! Process-wide provider weight table with slow adaptive nudging.
//!
//! Concurrent runs read-modify-write the table; last writer wins.

use std::collections::BTreeMap;

use designlens_core::model_response::{ModelResponse, ProviderName};
use designlens_core::synthesis::{default_weights, recomputed_confidence, renormalize};
use tokio::sync::RwLock;

pub const SUCCESS_NUDGE: f64 = 1.05;
pub const FAILURE_NUDGE: f64 = 0.90;
pub const MIN_WEIGHT: f64 = 0.05;
pub const MAX_WEIGHT: f64 = 0.90;

/// Recomputed confidence at or above which a provider is rewarded.
pub const REWARD_CONFIDENCE: f64 = 0.8;

#[derive(Debug)]
pub struct WeightTable {
    weights: RwLock<BTreeMap<ProviderName, f64>>,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::new(default_weights())
    }
}

impl WeightTable {
    pub fn new(initial: BTreeMap<ProviderName, f64>) -> Self {
        Self {
            weights: RwLock::new(initial),
        }
    }

    pub async fn snapshot(&self) -> BTreeMap<ProviderName, f64> {
        self.weights.read().await.clone()
    }

    /// Nudge each weight according to one run's results, then renormalize.
    pub async fn adjust(&self, results: &[ModelResponse]) {
        let mut weights = self.weights.write().await;
        for result in results {
            let Some(weight) = weights.get_mut(&result.provider_name) else {
                continue;
            };
            let factor = nudge_factor(result);
            *weight = (*weight * factor).clamp(MIN_WEIGHT, MAX_WEIGHT);
        }
        renormalize(&mut weights);
        tracing::debug!(weights = ?*weights, "Provider weights adjusted");
    }
}

fn nudge_factor(result: &ModelResponse) -> f64 {
    if !result.success {
        FAILURE_NUDGE
    } else if result.research.is_some() || recomputed_confidence(result) >= REWARD_CONFIDENCE {
        SUCCESS_NUDGE
    } else {
        1.0
    }
}
