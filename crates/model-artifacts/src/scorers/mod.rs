//! Concrete scorers built from JSON model artifacts.

mod logistic;
mod tree_ensemble;

pub use logistic::{LogisticModel, LogisticScorer};
pub use tree_ensemble::{TreeEnsembleModel, TreeEnsembleScorer};

use risk_core::{FeatureSchema, Scorer};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ArtifactResult;

/// On-disk scorer description, selected by its `kind` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScorerArtifact {
    Logistic(LogisticModel),
    TreeEnsemble(TreeEnsembleModel),
}

impl ScorerArtifact {
    /// Resolve feature names against `schema` and produce a ready scorer.
    pub fn build(self, schema: &FeatureSchema) -> ArtifactResult<Arc<dyn Scorer>> {
        let scorer: Arc<dyn Scorer> = match self {
            ScorerArtifact::Logistic(model) => Arc::new(LogisticScorer::from_model(model, schema)?),
            ScorerArtifact::TreeEnsemble(model) => {
                Arc::new(TreeEnsembleScorer::from_model(model, schema)?)
            }
        };
        Ok(scorer)
    }
}

/// Logistic link, stable for large |x|.
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
