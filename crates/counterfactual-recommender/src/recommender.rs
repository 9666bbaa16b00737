use risk_core::{
    round_to, serialize_round3, serialize_round4, FeatureVector, RiskResult, Scorer,
    RECOMMENDATION_PRECISION,
};
use serde::Serialize;
use std::cmp::Ordering;

use crate::{CandidateCatalog, Delta};

/// Longest recommendation list ever returned, and the default length.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// One risk-lowering single-feature edit.
///
/// Risk fields hold full precision; they are rounded to three decimals only
/// when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Recommendation {
    pub feature: String,
    pub delta: f64,
    /// Signed catalog form of `delta`, e.g. `+0.05` or `+1.0`
    pub change: String,
    #[serde(serialize_with = "serialize_round3")]
    pub risk_before: f64,
    #[serde(serialize_with = "serialize_round3")]
    pub risk_after: f64,
    #[serde(serialize_with = "serialize_round3")]
    pub risk_reduction: f64,
}

impl Recommendation {
    /// Reduction as reported to callers; ranking uses this value.
    pub fn reported_reduction(&self) -> f64 {
        round_to(self.risk_reduction, RECOMMENDATION_PRECISION)
    }
}

/// Baseline risk plus the ranked recommendations for one vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecommendationSet {
    #[serde(serialize_with = "serialize_round4")]
    pub baseline_risk: f64,
    pub recommendations: Vec<Recommendation>,
}

/// Greedy single-step counterfactual search over a [`CandidateCatalog`].
#[derive(Debug, Clone)]
pub struct Recommender {
    catalog: CandidateCatalog,
    max_recommendations: usize,
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(CandidateCatalog::default())
    }
}

impl Recommender {
    pub fn new(catalog: CandidateCatalog) -> Self {
        Self {
            catalog,
            max_recommendations: MAX_RECOMMENDATIONS,
        }
    }

    /// Shorter lists only; anything above [`MAX_RECOMMENDATIONS`] is capped.
    pub fn with_max_recommendations(mut self, max: usize) -> Self {
        self.max_recommendations = max.min(MAX_RECOMMENDATIONS);
        self
    }

    pub fn catalog(&self) -> &CandidateCatalog {
        &self.catalog
    }

    pub fn max_recommendations(&self) -> usize {
        self.max_recommendations
    }

    /// Score `features`, then try every catalog delta as an independent edit
    /// of the original vector.
    ///
    /// The scorer runs once for the baseline and once per delta of every
    /// catalog feature present in the schema. Catalog features the schema
    /// lacks are skipped without error. Scorer errors abort the search.
    pub fn recommend(
        &self,
        features: &FeatureVector,
        scorer: &dyn Scorer,
    ) -> RiskResult<RecommendationSet> {
        let baseline = scorer.score(features)?.value();

        let mut evaluated = 0usize;
        let mut recommendations = Vec::new();

        for action in self.catalog.actions() {
            if !features.schema().contains(&action.feature) {
                tracing::debug!(feature = %action.feature, "catalog feature not in schema, skipping");
                continue;
            }

            for &delta in &action.deltas {
                let Some(candidate) = features.with_delta(&action.feature, delta.value()) else {
                    continue;
                };
                let risk_after = scorer.score(&candidate)?.value();
                evaluated += 1;

                if risk_after < baseline {
                    recommendations.push(Recommendation {
                        feature: action.feature.clone(),
                        delta: delta.value(),
                        change: format_change(delta),
                        risk_before: baseline,
                        risk_after,
                        risk_reduction: baseline - risk_after,
                    });
                }
            }
        }

        let improving = recommendations.len();
        // sort_by is stable: equal reductions keep catalog order
        recommendations.sort_by(|a, b| {
            b.reported_reduction()
                .partial_cmp(&a.reported_reduction())
                .unwrap_or(Ordering::Equal)
        });
        recommendations.truncate(self.max_recommendations);

        tracing::debug!(
            baseline,
            evaluated,
            improving,
            returned = recommendations.len(),
            "counterfactual search finished"
        );

        Ok(RecommendationSet {
            baseline_risk: baseline,
            recommendations,
        })
    }
}

fn format_change(delta: Delta) -> String {
    format!("+{delta}")
}
