//! Counterfactual Recommender
//!
//! Bounded what-if search: nudge one feature at a time by a configured amount,
//! re-score, and keep the nudges that lower predicted risk.

pub mod catalog;
pub mod recommender;

pub use catalog::{CandidateAction, CandidateCatalog, Delta};
pub use recommender::{
    Recommendation, RecommendationSet, Recommender, MAX_RECOMMENDATIONS,
};
