use risk_core::{FeatureSchema, FeatureVector, Probability, RiskError, RiskResult, Scorer};
use serde::Deserialize;
use std::collections::HashMap;

use super::sigmoid;
use crate::error::{ArtifactError, ArtifactResult};

/// `{"kind": "logistic", "intercept": .., "coefficients": {"name": weight}}`
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticModel {
    #[serde(default)]
    pub intercept: f64,
    pub coefficients: HashMap<String, f64>,
}

/// Linear model with a logistic link. Schema features without a
/// coefficient have weight zero.
#[derive(Debug, Clone)]
pub struct LogisticScorer {
    intercept: f64,
    weights: Vec<f64>,
}

impl LogisticScorer {
    pub fn from_model(model: LogisticModel, schema: &FeatureSchema) -> ArtifactResult<Self> {
        if !model.intercept.is_finite() {
            return Err(ArtifactError::InvalidModel("intercept is not finite".into()));
        }

        let mut weights = vec![0.0; schema.len()];
        for (name, weight) in &model.coefficients {
            let position = schema.position(name).ok_or_else(|| {
                ArtifactError::InvalidModel(format!("coefficient for unknown feature '{name}'"))
            })?;
            if !weight.is_finite() {
                return Err(ArtifactError::InvalidModel(format!(
                    "coefficient for '{name}' is not finite"
                )));
            }
            weights[position] = *weight;
        }

        Ok(Self {
            intercept: model.intercept,
            weights,
        })
    }
}

impl Scorer for LogisticScorer {
    fn score(&self, features: &FeatureVector) -> RiskResult<Probability> {
        let values = features.values();
        if values.len() != self.weights.len() {
            return Err(RiskError::ScorerFailed(format!(
                "expected {} features, got {}",
                self.weights.len(),
                values.len()
            )));
        }

        let z = self.intercept
            + self
                .weights
                .iter()
                .zip(values)
                .map(|(w, x)| w * x)
                .sum::<f64>();

        Probability::new(sigmoid(z))
    }

    fn backend_name(&self) -> &'static str {
        "logistic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use risk_core::{align, RawFeatures};
    use std::sync::Arc;

    fn schema() -> Arc<FeatureSchema> {
        Arc::new(FeatureSchema::new(["attendance_mean", "study_hours_sum"]).unwrap())
    }

    #[test]
    fn test_logistic_scores_and_is_deterministic() {
        let model: LogisticModel = serde_json::from_str(
            r#"{"intercept": 1.0, "coefficients": {"study_hours_sum": -0.1, "attendance_mean": -2.0}}"#,
        )
        .unwrap();
        let scorer = LogisticScorer::from_model(model, &schema()).unwrap();

        let raw: RawFeatures = [("study_hours_sum".to_string(), 10.0)].into_iter().collect();
        let features = align(&raw, &schema());
        let p = scorer.score(&features).unwrap();

        // z = 1.0 - 0.1 * 10 = 0
        assert!((p.value() - 0.5).abs() < 1e-12);
        assert_eq!(scorer.score(&features).unwrap(), p);

        let more = features.with_delta("attendance_mean", 0.5).unwrap();
        assert!(scorer.score(&more).unwrap() < p);
    }

    #[test]
    fn test_unknown_coefficient_is_rejected() {
        let model: LogisticModel =
            serde_json::from_str(r#"{"coefficients": {"shoe_size": 1.0}}"#).unwrap();
        assert!(matches!(
            LogisticScorer::from_model(model, &schema()),
            Err(ArtifactError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_vector_from_other_schema_fails() {
        let model: LogisticModel = serde_json::from_str(r#"{"coefficients": {}}"#).unwrap();
        let scorer = LogisticScorer::from_model(model, &schema()).unwrap();

        let other = Arc::new(FeatureSchema::new(["x"]).unwrap());
        let features = align(&RawFeatures::new(), &other);
        assert!(matches!(
            scorer.score(&features),
            Err(RiskError::ScorerFailed(_))
        ));
    }
}
