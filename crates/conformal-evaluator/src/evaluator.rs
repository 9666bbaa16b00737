//! Split conformal prediction for a binary risk classifier.
//!
//! With nonconformity score `1 - p(y)`, label `y` belongs to the prediction
//! set when its score is within the calibration threshold `qhat`:
//!
//! - label 1 is plausible when `1 - p <= qhat`
//! - label 0 is plausible when `p <= qhat`
//!
//! `qhat` comes from an offline calibration run and is fixed for the life of
//! the process.

use risk_core::{Probability, RiskError, RiskResult};
use serde::{Deserialize, Serialize};

/// Labels that remain statistically plausible for a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum PredictionSet {
    #[serde(rename = "{0}")]
    LowOnly,
    #[serde(rename = "{1}")]
    HighOnly,
    #[serde(rename = "{0,1}")]
    Both,
}

impl PredictionSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionSet::LowOnly => "{0}",
            PredictionSet::HighOnly => "{1}",
            PredictionSet::Both => "{0,1}",
        }
    }

    pub fn contains(&self, label: u8) -> bool {
        match self {
            PredictionSet::LowOnly => label == 0,
            PredictionSet::HighOnly => label == 1,
            PredictionSet::Both => label <= 1,
        }
    }

    pub fn uncertainty_level(&self) -> UncertaintyLevel {
        match self {
            PredictionSet::LowOnly => UncertaintyLevel::ConfidentLowRisk,
            PredictionSet::HighOnly => UncertaintyLevel::ConfidentHighRisk,
            PredictionSet::Both => UncertaintyLevel::UncertainNeedMoreData,
        }
    }
}

/// Uncertainty classification, one per prediction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyLevel {
    /// Only label 0 survives calibration
    ConfidentLowRisk,
    /// Only label 1 survives calibration
    ConfidentHighRisk,
    /// Both labels survive; the model cannot separate them at this threshold
    UncertainNeedMoreData,
}

impl UncertaintyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UncertaintyLevel::ConfidentLowRisk => "confident_low_risk",
            UncertaintyLevel::ConfidentHighRisk => "confident_high_risk",
            UncertaintyLevel::UncertainNeedMoreData => "uncertain_need_more_data",
        }
    }

    /// Position along the low → uncertain → high ordering.
    pub fn rank(&self) -> u8 {
        match self {
            UncertaintyLevel::ConfidentLowRisk => 0,
            UncertaintyLevel::UncertainNeedMoreData => 1,
            UncertaintyLevel::ConfidentHighRisk => 2,
        }
    }
}

/// Result of evaluating one probability against `qhat`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConformalOutcome {
    pub prediction_set: PredictionSet,
    pub uncertainty_level: UncertaintyLevel,
    pub include_0: bool,
    pub include_1: bool,
}

/// Decision table, first match wins:
/// both labels → `{0,1}`; label 1 only → `{1}`; anything else → `{0}`.
///
/// A negative `qhat` admits neither label, so every probability falls through
/// to `{0}`.
pub fn evaluate(probability: Probability, qhat: f64) -> ConformalOutcome {
    let p = probability.value();
    let include_1 = (1.0 - p) <= qhat;
    let include_0 = p <= qhat;

    let prediction_set = if include_0 && include_1 {
        PredictionSet::Both
    } else if include_1 {
        PredictionSet::HighOnly
    } else {
        PredictionSet::LowOnly
    };

    ConformalOutcome {
        prediction_set,
        uncertainty_level: prediction_set.uncertainty_level(),
        include_0,
        include_1,
    }
}

/// Evaluator bound to a fixed calibration threshold.
#[derive(Debug, Clone, Copy)]
pub struct ConformalEvaluator {
    qhat: f64,
}

impl ConformalEvaluator {
    /// `qhat` must be a finite number. Negative or very large values are
    /// accepted and produce the degenerate classifications of [`evaluate`].
    pub fn new(qhat: f64) -> RiskResult<Self> {
        if !qhat.is_finite() {
            return Err(RiskError::InvalidThreshold(qhat));
        }
        if qhat < 0.0 {
            tracing::warn!(qhat, "negative qhat: every prediction will be {{0}}");
        } else if qhat >= 1.0 {
            tracing::warn!(qhat, "qhat >= 1: every prediction will be {{0,1}}");
        }
        Ok(Self { qhat })
    }

    pub fn qhat(&self) -> f64 {
        self.qhat
    }

    pub fn evaluate(&self, probability: Probability) -> ConformalOutcome {
        evaluate(probability, self.qhat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(value: f64) -> Probability {
        Probability::new(value).unwrap()
    }

    #[test]
    fn test_midpoint_is_uncertain_when_qhat_at_least_half() {
        for qhat in [0.5, 0.6, 0.75, 1.0, 3.0] {
            let outcome = evaluate(p(0.5), qhat);
            assert!(outcome.include_0 && outcome.include_1);
            assert_eq!(outcome.prediction_set, PredictionSet::Both);
            assert_eq!(
                outcome.uncertainty_level,
                UncertaintyLevel::UncertainNeedMoreData
            );
        }
    }

    #[test]
    fn test_midpoint_below_half_qhat_is_low_risk() {
        let outcome = evaluate(p(0.5), 0.4);
        assert!(!outcome.include_0);
        assert!(!outcome.include_1);
        assert_eq!(outcome.prediction_set, PredictionSet::LowOnly);
        assert_eq!(outcome.uncertainty_level, UncertaintyLevel::ConfidentLowRisk);
    }

    #[test]
    fn test_confident_cases() {
        let high = evaluate(p(0.9), 0.2);
        assert_eq!(high.prediction_set, PredictionSet::HighOnly);
        assert_eq!(high.uncertainty_level, UncertaintyLevel::ConfidentHighRisk);

        let low = evaluate(p(0.1), 0.2);
        assert_eq!(low.prediction_set, PredictionSet::LowOnly);
        assert_eq!(low.uncertainty_level, UncertaintyLevel::ConfidentLowRisk);
        assert!(low.include_0 && !low.include_1);
    }

    #[test]
    fn test_negative_qhat_always_low_risk() {
        for i in 0..=100 {
            let outcome = evaluate(p(i as f64 / 100.0), -0.1);
            assert!(!outcome.include_0 && !outcome.include_1);
            assert_eq!(outcome.prediction_set, PredictionSet::LowOnly);
        }
    }

    #[test]
    fn test_set_and_label_correspond() {
        for qhat in [-1.0, 0.0, 0.1, 0.3, 0.5, 0.7, 1.0, 2.0] {
            for i in 0..=200 {
                let outcome = evaluate(p(i as f64 / 200.0), qhat);
                assert_eq!(
                    outcome.uncertainty_level,
                    outcome.prediction_set.uncertainty_level()
                );
                assert!(outcome.prediction_set.contains(0) || outcome.prediction_set.contains(1));
            }
        }
    }

    #[test]
    fn test_labels_never_reverse_as_probability_rises() {
        for qhat in [0.0, 0.05, 0.2, 0.45, 0.5, 0.55, 0.9, 1.0, 1.5] {
            let mut last_rank = 0;
            for i in 0..=1000 {
                let rank = evaluate(p(i as f64 / 1000.0), qhat).uncertainty_level.rank();
                assert!(
                    rank >= last_rank,
                    "label regressed at p={} qhat={}",
                    i as f64 / 1000.0,
                    qhat
                );
                last_rank = rank;
            }
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_value(PredictionSet::Both).unwrap(),
            serde_json::json!("{0,1}")
        );
        assert_eq!(
            serde_json::to_value(UncertaintyLevel::ConfidentHighRisk).unwrap(),
            serde_json::json!("confident_high_risk")
        );
        assert_eq!(PredictionSet::LowOnly.as_str(), "{0}");
        assert_eq!(
            UncertaintyLevel::UncertainNeedMoreData.as_str(),
            "uncertain_need_more_data"
        );
    }

    #[test]
    fn test_evaluator_rejects_non_finite_qhat() {
        assert!(ConformalEvaluator::new(f64::NAN).is_err());
        assert!(ConformalEvaluator::new(f64::INFINITY).is_err());
        let evaluator = ConformalEvaluator::new(-0.5).unwrap();
        assert_eq!(
            evaluator.evaluate(p(0.99)).prediction_set,
            PredictionSet::LowOnly
        );
    }
}
