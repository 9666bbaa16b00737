//! Conformal Uncertainty Evaluator
//!
//! Turns a risk probability into a split-conformal prediction set over the
//! binary labels `{0, 1}` and a human-friendly uncertainty label.

pub mod evaluator;

pub use evaluator::{evaluate, ConformalEvaluator, ConformalOutcome, PredictionSet, UncertaintyLevel};
