use risk_core::{RiskError, RiskResult};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// One perturbation step, remembering whether it was written as an integer.
///
/// `5` displays as `5` and `1.0` as `1.0`, so a recommendation's `change`
/// text matches the catalog entry it came from.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Number")]
pub struct Delta {
    value: f64,
    integer: bool,
}

impl Delta {
    pub fn integer(value: i64) -> Self {
        Self {
            value: value as f64,
            integer: true,
        }
    }

    pub fn float(value: f64) -> Self {
        Self {
            value,
            integer: false,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_integer(&self) -> bool {
        self.integer
    }
}

impl From<i32> for Delta {
    fn from(value: i32) -> Self {
        Self::integer(value.into())
    }
}

impl From<f64> for Delta {
    fn from(value: f64) -> Self {
        Self::float(value)
    }
}

impl TryFrom<serde_json::Number> for Delta {
    type Error = String;

    fn try_from(number: serde_json::Number) -> Result<Self, Self::Error> {
        let value = number
            .as_f64()
            .ok_or_else(|| format!("delta {number} is not representable as f64"))?;
        Ok(Self {
            value,
            integer: !number.is_f64(),
        })
    }
}

impl Serialize for Delta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.integer {
            serializer.serialize_i64(self.value as i64)
        } else {
            serializer.serialize_f64(self.value)
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.integer {
            write!(f, "{}", self.value)
        } else {
            // Debug keeps the trailing `.0` on whole floats
            write!(f, "{:?}", self.value)
        }
    }
}

/// Feature to nudge and the step sizes to try, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAction {
    pub feature: String,
    pub deltas: Vec<Delta>,
}

impl CandidateAction {
    pub fn new<D: Into<Delta>>(feature: impl Into<String>, deltas: Vec<D>) -> Self {
        Self {
            feature: feature.into(),
            deltas: deltas.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered list of candidate actions.
///
/// Declaration order is iteration order, and iteration order decides which
/// of two equally good recommendations is listed first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CandidateAction>", into = "Vec<CandidateAction>")]
pub struct CandidateCatalog {
    actions: Vec<CandidateAction>,
}

impl Default for CandidateCatalog {
    fn default() -> Self {
        Self {
            actions: vec![
                // total study hours
                CandidateAction::new("study_hours_sum", vec![5, 10]),
                // +5% / +10% attendance
                CandidateAction::new("attendance_mean", vec![0.05, 0.10]),
                // +0.5 / +1 hour sleep
                CandidateAction::new("sleep_mean", vec![0.5, 1.0]),
                CandidateAction::new("consistency_score_mean", vec![5, 10]),
            ],
        }
    }
}

impl CandidateCatalog {
    /// Every delta must be finite and strictly positive, and each feature may
    /// appear once. An empty catalog is valid and yields no recommendations.
    pub fn new(actions: Vec<CandidateAction>) -> RiskResult<Self> {
        let mut seen = HashSet::new();
        for action in &actions {
            if action.feature.is_empty() {
                return Err(RiskError::InvalidCatalog("empty feature name".into()));
            }
            if !seen.insert(action.feature.as_str()) {
                return Err(RiskError::InvalidCatalog(format!(
                    "feature '{}' listed more than once",
                    action.feature
                )));
            }
            if let Some(bad) = action
                .deltas
                .iter()
                .find(|d| !d.value().is_finite() || d.value() <= 0.0)
            {
                return Err(RiskError::InvalidCatalog(format!(
                    "delta {} for '{}' must be a positive number",
                    bad, action.feature
                )));
            }
        }
        Ok(Self { actions })
    }

    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Parse a JSON array of `{"feature": .., "deltas": [..]}` objects.
    pub fn from_json_str(json: &str) -> RiskResult<Self> {
        let actions: Vec<CandidateAction> = serde_json::from_str(json)
            .map_err(|e| RiskError::InvalidCatalog(format!("malformed catalog: {e}")))?;
        Self::new(actions)
    }

    pub fn actions(&self) -> &[CandidateAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Total number of perturbations across all features.
    pub fn candidate_count(&self) -> usize {
        self.actions.iter().map(|a| a.deltas.len()).sum()
    }
}

impl TryFrom<Vec<CandidateAction>> for CandidateCatalog {
    type Error = RiskError;

    fn try_from(actions: Vec<CandidateAction>) -> RiskResult<Self> {
        Self::new(actions)
    }
}

impl From<CandidateCatalog> for Vec<CandidateAction> {
    fn from(catalog: CandidateCatalog) -> Self {
        catalog.actions
    }
}
