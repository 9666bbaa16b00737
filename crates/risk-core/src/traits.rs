use crate::{FeatureVector, Probability, RiskResult};

/// Trained binary classifier behind an opaque interface.
///
/// Implementations must be deterministic and reentrant: the same vector
/// always yields the same probability, and one instance is shared by every
/// request for the lifetime of the process.
pub trait Scorer: Send + Sync {
    /// Probability of the positive ("at risk") class.
    fn score(&self, features: &FeatureVector) -> RiskResult<Probability>;

    /// Short identifier for logs and health output.
    fn backend_name(&self) -> &'static str;
}

impl<S: Scorer + ?Sized> Scorer for std::sync::Arc<S> {
    fn score(&self, features: &FeatureVector) -> RiskResult<Probability> {
        (**self).score(features)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
