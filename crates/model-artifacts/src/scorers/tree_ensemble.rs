use risk_core::{FeatureSchema, FeatureVector, Probability, RiskError, RiskResult, Scorer};
use serde::Deserialize;

use super::sigmoid;
use crate::error::{ArtifactError, ArtifactResult};

/// Boosted decision trees summed in logit space.
///
/// ```json
/// {"kind": "tree_ensemble", "base_score": -0.2, "trees": [
///   {"nodes": [
///     {"feature": "attendance_mean", "threshold": 0.8, "left": 1, "right": 2},
///     {"leaf": 0.9},
///     {"leaf": -0.6}
///   ]}
/// ]}
/// ```
///
/// A sample goes left when `value <= threshold`.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsembleModel {
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<TreeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeSpec {
    pub nodes: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Leaf {
        leaf: f64,
    },
    Split {
        feature: String,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn compile(index: usize, spec: TreeSpec, schema: &FeatureSchema) -> ArtifactResult<Self> {
        if spec.nodes.is_empty() {
            return Err(ArtifactError::InvalidModel(format!("tree {index} has no nodes")));
        }

        let len = spec.nodes.len();
        let mut nodes = Vec::with_capacity(len);
        for (position, node) in spec.nodes.into_iter().enumerate() {
            let compiled = match node {
                NodeSpec::Leaf { leaf } => {
                    if !leaf.is_finite() {
                        return Err(ArtifactError::InvalidModel(format!(
                            "tree {index} node {position}: leaf value is not finite"
                        )));
                    }
                    Node::Leaf(leaf)
                }
                NodeSpec::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let feature_position = schema.position(&feature).ok_or_else(|| {
                        ArtifactError::InvalidModel(format!(
                            "tree {index} node {position}: unknown feature '{feature}'"
                        ))
                    })?;
                    // children must point forward, which also rules out cycles
                    for child in [left, right] {
                        if child <= position || child >= len {
                            return Err(ArtifactError::InvalidModel(format!(
                                "tree {index} node {position}: child {child} out of range"
                            )));
                        }
                    }
                    Node::Split {
                        feature: feature_position,
                        threshold,
                        left,
                        right,
                    }
                }
            };
            nodes.push(compiled);
        }

        Ok(Self { nodes })
    }

    fn predict(&self, values: &[f64]) -> f64 {
        let mut current = 0;
        loop {
            match self.nodes[current] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    current = if values[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeEnsembleScorer {
    base_score: f64,
    trees: Vec<Tree>,
    feature_count: usize,
}

impl TreeEnsembleScorer {
    pub fn from_model(model: TreeEnsembleModel, schema: &FeatureSchema) -> ArtifactResult<Self> {
        if !model.base_score.is_finite() {
            return Err(ArtifactError::InvalidModel("base_score is not finite".into()));
        }
        if model.trees.is_empty() {
            return Err(ArtifactError::InvalidModel("ensemble has no trees".into()));
        }

        let trees = model
            .trees
            .into_iter()
            .enumerate()
            .map(|(index, spec)| Tree::compile(index, spec, schema))
            .collect::<ArtifactResult<Vec<_>>>()?;

        Ok(Self {
            base_score: model.base_score,
            trees,
            feature_count: schema.len(),
        })
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Scorer for TreeEnsembleScorer {
    fn score(&self, features: &FeatureVector) -> RiskResult<Probability> {
        let values = features.values();
        if values.len() != self.feature_count {
            return Err(RiskError::ScorerFailed(format!(
                "expected {} features, got {}",
                self.feature_count,
                values.len()
            )));
        }

        let margin = self.base_score + self.trees.iter().map(|t| t.predict(values)).sum::<f64>();
        Probability::new(sigmoid(margin))
    }

    fn backend_name(&self) -> &'static str {
        "tree_ensemble"
    }
}
