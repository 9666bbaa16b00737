use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid probability: {0}")]
    InvalidProbability(f64),

    #[error("Invalid calibration threshold: {0}")]
    InvalidThreshold(f64),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Scorer failed: {0}")]
    ScorerFailed(String),
}

pub type RiskResult<T> = Result<T, RiskError>;
