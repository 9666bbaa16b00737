use std::path::PathBuf;
use thiserror::Error;

use risk_core::RiskError;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error(transparent)]
    Risk(#[from] RiskError),
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;
