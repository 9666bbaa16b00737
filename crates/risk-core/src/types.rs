use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{RiskError, RiskResult};

/// Caller-supplied feature record before alignment.
pub type RawFeatures = HashMap<String, f64>;

/// Ordered, duplicate-free list of feature names a scorer was trained on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    pub fn new<I, S>(names: I) -> RiskResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(RiskError::InvalidSchema("schema has no features".into()));
        }

        let mut index = HashMap::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(RiskError::InvalidSchema(format!(
                    "empty feature name at position {position}"
                )));
            }
            if index.insert(name.clone(), position).is_some() {
                return Err(RiskError::InvalidSchema(format!(
                    "duplicate feature '{name}'"
                )));
            }
        }

        Ok(Self { names, index })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

/// Numeric record laid out exactly in schema order.
///
/// Only [`FeatureVector::align`] and [`FeatureVector::with_delta`] build one,
/// so every vector that reaches a scorer matches the schema field for field.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    schema: Arc<FeatureSchema>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Lay out `raw` in schema order. Schema fields missing from `raw` are
    /// zero; fields `raw` carries that the schema does not know are dropped.
    pub fn align(raw: &RawFeatures, schema: &Arc<FeatureSchema>) -> Self {
        let values = schema
            .names()
            .iter()
            .map(|name| raw.get(name).copied().unwrap_or(0.0))
            .collect();

        Self {
            schema: Arc::clone(schema),
            values,
        }
    }

    /// Copy of this vector with `delta` added to `feature`.
    /// Returns `None` when the schema has no such feature.
    pub fn with_delta(&self, feature: &str, delta: f64) -> Option<Self> {
        let position = self.schema.position(feature)?;
        let mut values = self.values.clone();
        values[position] += delta;
        Some(Self {
            schema: Arc::clone(&self.schema),
            values,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.schema.position(feature).map(|i| self.values[i])
    }

    /// `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Align a raw record to `schema`. See [`FeatureVector::align`].
pub fn align(raw: &RawFeatures, schema: &Arc<FeatureSchema>) -> FeatureVector {
    FeatureVector::align(raw, schema)
}

/// Scorer output for the positive ("at risk") class, always within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Probability(f64);

impl Probability {
    pub fn new(value: f64) -> RiskResult<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RiskError::InvalidProbability(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Probability {
    type Error = RiskError;

    fn try_from(value: f64) -> RiskResult<Self> {
        Self::new(value)
    }
}

impl From<Probability> for f64 {
    fn from(p: Probability) -> Self {
        p.0
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}
