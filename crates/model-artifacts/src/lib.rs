//! Startup loading of everything the decision layer reads from disk:
//! the feature schema, the conformal threshold, the scorer artifact and an
//! optional recommendation catalog.
//!
//! Everything here runs once before the server accepts traffic. Any failure
//! is returned to the caller, which must refuse to serve.

pub mod error;
pub mod scorers;

pub use error::{ArtifactError, ArtifactResult};
pub use scorers::{LogisticScorer, ScorerArtifact, TreeEnsembleScorer};

use counterfactual_recommender::CandidateCatalog;
use risk_core::{FeatureSchema, RiskError, Scorer};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const MODEL_FILE: &str = "risk_model.json";
pub const FEATURES_FILE: &str = "feature_columns.json";
pub const QHAT_FILE: &str = "conformal_qhat.json";

/// Locations of the three required artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub features: PathBuf,
    pub qhat: PathBuf,
}

impl ArtifactPaths {
    /// Conventional file names under `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join(MODEL_FILE),
            features: dir.join(FEATURES_FILE),
            qhat: dir.join(QHAT_FILE),
        }
    }
}

/// Read-only state shared by every request for the life of the process.
#[derive(Clone)]
pub struct LoadedArtifacts {
    pub scorer: Arc<dyn Scorer>,
    pub schema: Arc<FeatureSchema>,
    pub qhat: f64,
}

impl std::fmt::Debug for LoadedArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedArtifacts")
            .field("scorer", &self.scorer.backend_name())
            .field("features", &self.schema.len())
            .field("qhat", &self.qhat)
            .finish()
    }
}

/// `qhat` may be stored bare (`0.42`) or wrapped (`{"qhat": 0.42}`).
#[derive(Deserialize)]
#[serde(untagged)]
enum QhatFile {
    Bare(f64),
    Wrapped { qhat: f64 },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ArtifactResult<T> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// JSON array of feature names, in training order.
pub fn load_schema(path: &Path) -> ArtifactResult<Arc<FeatureSchema>> {
    let names: Vec<String> = read_json(path)?;
    Ok(Arc::new(FeatureSchema::new(names)?))
}

pub fn load_qhat(path: &Path) -> ArtifactResult<f64> {
    let qhat = match read_json::<QhatFile>(path)? {
        QhatFile::Bare(q) | QhatFile::Wrapped { qhat: q } => q,
    };
    if !qhat.is_finite() {
        return Err(RiskError::InvalidThreshold(qhat).into());
    }
    Ok(qhat)
}

pub fn load_scorer(path: &Path, schema: &FeatureSchema) -> ArtifactResult<Arc<dyn Scorer>> {
    let artifact: ScorerArtifact = read_json(path)?;
    artifact.build(schema)
}

pub fn load_catalog(path: &Path) -> ArtifactResult<CandidateCatalog> {
    let bytes = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(CandidateCatalog::from_json_str(&bytes)?)
}

/// Load schema, threshold and scorer, in that order.
pub fn load_artifacts(paths: &ArtifactPaths) -> ArtifactResult<LoadedArtifacts> {
    tracing::info!(
        "Loading artifacts (model={}, features={}, qhat={})",
        paths.model.display(),
        paths.features.display(),
        paths.qhat.display()
    );

    let schema = load_schema(&paths.features)?;
    let qhat = load_qhat(&paths.qhat)?;
    let scorer = load_scorer(&paths.model, &schema)?;

    tracing::info!(
        features = schema.len(),
        qhat,
        backend = scorer.backend_name(),
        "Artifacts loaded"
    );

    Ok(LoadedArtifacts {
        scorer,
        schema,
        qhat,
    })
}
