//! Risk decision layer: point score, conformal uncertainty and counterfactual
//! recommendations over one shared, immutable scorer.

use conformal_evaluator::{ConformalEvaluator, PredictionSet, UncertaintyLevel};
use counterfactual_recommender::{RecommendationSet, Recommender};
use model_artifacts::LoadedArtifacts;
use risk_core::{
    serialize_round4, FeatureSchema, FeatureVector, Probability, RawFeatures, RiskResult, Scorer,
};
use serde::Serialize;
use std::sync::Arc;

/// `POST /predict` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScoreResponse {
    #[serde(serialize_with = "serialize_round4")]
    pub risk_probability: f64,
}

/// `POST /uncertainty` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UncertaintyResponse {
    #[serde(serialize_with = "serialize_round4")]
    pub risk_probability: f64,
    pub prediction_set: PredictionSet,
    pub uncertainty_level: UncertaintyLevel,
}

/// `POST /recommend` body.
pub type RecommendResponse = RecommendationSet;

/// Everything a request needs, built once at startup and shared read-only.
pub struct DecisionEngine {
    scorer: Arc<dyn Scorer>,
    schema: Arc<FeatureSchema>,
    evaluator: ConformalEvaluator,
    recommender: Recommender,
}

impl DecisionEngine {
    pub fn new(
        scorer: Arc<dyn Scorer>,
        schema: Arc<FeatureSchema>,
        qhat: f64,
        recommender: Recommender,
    ) -> RiskResult<Self> {
        Ok(Self {
            scorer,
            schema,
            evaluator: ConformalEvaluator::new(qhat)?,
            recommender,
        })
    }

    pub fn from_artifacts(artifacts: LoadedArtifacts, recommender: Recommender) -> RiskResult<Self> {
        let engine = Self::new(
            artifacts.scorer,
            artifacts.schema,
            artifacts.qhat,
            recommender,
        )?;
        tracing::info!(
            backend = engine.scorer.backend_name(),
            features = engine.schema.len(),
            qhat = engine.evaluator.qhat(),
            catalog_features = engine.recommender.catalog().len(),
            candidates = engine.recommender.catalog().candidate_count(),
            max_recommendations = engine.recommender.max_recommendations(),
            "Decision engine ready"
        );
        Ok(engine)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn qhat(&self) -> f64 {
        self.evaluator.qhat()
    }

    pub fn backend_name(&self) -> &'static str {
        self.scorer.backend_name()
    }

    pub fn align(&self, raw: &RawFeatures) -> FeatureVector {
        FeatureVector::align(raw, &self.schema)
    }

    fn probability(&self, raw: &RawFeatures) -> RiskResult<Probability> {
        self.scorer.score(&self.align(raw))
    }

    pub fn score(&self, raw: &RawFeatures) -> RiskResult<ScoreResponse> {
        let probability = self.probability(raw)?;
        Ok(ScoreResponse {
            risk_probability: probability.value(),
        })
    }

    pub fn classify_uncertainty(&self, raw: &RawFeatures) -> RiskResult<UncertaintyResponse> {
        let probability = self.probability(raw)?;
        let outcome = self.evaluator.evaluate(probability);
        tracing::debug!(
            probability = probability.value(),
            include_0 = outcome.include_0,
            include_1 = outcome.include_1,
            level = outcome.uncertainty_level.as_str(),
            "conformal evaluation"
        );
        Ok(UncertaintyResponse {
            risk_probability: probability.value(),
            prediction_set: outcome.prediction_set,
            uncertainty_level: outcome.uncertainty_level,
        })
    }

    pub fn recommend(&self, raw: &RawFeatures) -> RiskResult<RecommendResponse> {
        let features = self.align(raw);
        self.recommender.recommend(&features, self.scorer.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counterfactual_recommender::{CandidateAction, CandidateCatalog};
    use risk_core::RiskError;

    /// `1 - 0.1*a - 0.05*b`, clamped to [0, 1].
    struct LinearScorer;

    impl Scorer for LinearScorer {
        fn score(&self, features: &FeatureVector) -> RiskResult<Probability> {
            let a = features.get("a").unwrap_or(0.0);
            let b = features.get("b").unwrap_or(0.0);
            Probability::new((1.0 - 0.1 * a - 0.05 * b).clamp(0.0, 1.0))
        }

        fn backend_name(&self) -> &'static str {
            "linear-stub"
        }
    }

    /// Returns whatever the `p` feature holds, valid or not.
    struct EchoScorer;

    impl Scorer for EchoScorer {
        fn score(&self, features: &FeatureVector) -> RiskResult<Probability> {
            Probability::new(features.get("p").unwrap_or(0.0))
        }

        fn backend_name(&self) -> &'static str {
            "echo-stub"
        }
    }

    fn raw(pairs: &[(&str, f64)]) -> RawFeatures {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn linear_engine(qhat: f64) -> DecisionEngine {
        let schema = Arc::new(FeatureSchema::new(["a", "b"]).unwrap());
        let catalog = CandidateCatalog::new(vec![CandidateAction::new("a", vec![1])]).unwrap();
        DecisionEngine::new(Arc::new(LinearScorer), schema, qhat, Recommender::new(catalog)).unwrap()
    }

    fn echo_engine(qhat: f64) -> DecisionEngine {
        let schema = Arc::new(FeatureSchema::new(["p"]).unwrap());
        DecisionEngine::new(Arc::new(EchoScorer), schema, qhat, Recommender::default()).unwrap()
    }

    #[test]
    fn test_score_is_idempotent() {
        let engine = linear_engine(0.3);
        let input = raw(&[("a", 1.5), ("b", 2.0)]);
        assert_eq!(engine.score(&input).unwrap(), engine.score(&input).unwrap());
    }

    #[test]
    fn test_score_rounds_to_four_places() {
        let engine = echo_engine(0.3);
        let response = engine.score(&raw(&[("p", 0.123456)])).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({"risk_probability": 0.1235}));
    }

    #[test]
    fn test_extra_fields_do_not_reach_scorer() {
        let engine = linear_engine(0.3);
        let plain = engine.score(&raw(&[("a", 1.0)])).unwrap();
        let noisy = engine.score(&raw(&[("a", 1.0), ("zzz", 100.0)])).unwrap();
        assert_eq!(plain, noisy);
    }

    #[test]
    fn test_uncertainty_labels() {
        let engine = echo_engine(0.4);
        let mid = engine.classify_uncertainty(&raw(&[("p", 0.5)])).unwrap();
        assert_eq!(mid.prediction_set, PredictionSet::LowOnly);
        assert_eq!(mid.uncertainty_level, UncertaintyLevel::ConfidentLowRisk);

        let high = engine.classify_uncertainty(&raw(&[("p", 0.7)])).unwrap();
        assert_eq!(high.prediction_set, PredictionSet::HighOnly);

        let wide = echo_engine(0.6);
        let mid = wide.classify_uncertainty(&raw(&[("p", 0.5)])).unwrap();
        assert_eq!(mid.uncertainty_level, UncertaintyLevel::UncertainNeedMoreData);

        let json = serde_json::to_value(&mid).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "risk_probability": 0.5,
                "prediction_set": "{0,1}",
                "uncertainty_level": "uncertain_need_more_data"
            })
        );
    }

    #[test]
    fn test_recommend_scenario() {
        let engine = linear_engine(0.3);
        let response = engine.recommend(&raw(&[("a", 0.0), ("b", 0.0)])).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "baseline_risk": 1.0,
                "recommendations": [{
                    "feature": "a",
                    "delta": 1.0,
                    "change": "+1",
                    "risk_before": 1.0,
                    "risk_after": 0.9,
                    "risk_reduction": 0.1
                }]
            })
        );
    }

    #[test]
    fn test_invalid_scorer_output_propagates() {
        let engine = echo_engine(0.3);
        let result = engine.score(&raw(&[("p", 1.7)]));
        assert!(matches!(result, Err(RiskError::InvalidProbability(_))));
    }

    #[test]
    fn test_non_finite_qhat_rejected() {
        let schema = Arc::new(FeatureSchema::new(["p"]).unwrap());
        let result = DecisionEngine::new(Arc::new(EchoScorer), schema, f64::NAN, Recommender::default());
        assert!(result.is_err());
    }
}
