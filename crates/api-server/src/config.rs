use anyhow::{bail, Context, Result};
use counterfactual_recommender::MAX_RECOMMENDATIONS;
use model_artifacts::{ArtifactPaths, FEATURES_FILE, MODEL_FILE, QHAT_FILE};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Server settings, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub artifacts: ArtifactPaths,
    /// `None` means the built-in candidate catalog
    pub catalog_path: Option<PathBuf>,
    pub max_recommendations: usize,
    /// Empty means any origin
    pub frontend_origins: Vec<String>,
    pub enable_hsts: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let artifacts_dir =
            PathBuf::from(lookup("ARTIFACTS_DIR").unwrap_or_else(|| DEFAULT_ARTIFACTS_DIR.to_string()));
        let artifact_path = |key: &str, file: &str| {
            lookup(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| artifacts_dir.join(file))
        };

        let config = Self {
            bind_addr: lookup("BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
                .parse()
                .context("BIND_ADDR must be a socket address like 0.0.0.0:8000")?,

            artifacts: ArtifactPaths {
                model: artifact_path("MODEL_PATH", MODEL_FILE),
                features: artifact_path("FEATURES_PATH", FEATURES_FILE),
                qhat: artifact_path("QHAT_PATH", QHAT_FILE),
            },

            catalog_path: lookup("RECOMMEND_CATALOG_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            max_recommendations: parse_max_recommendations(lookup("MAX_RECOMMENDATIONS"))?,

            frontend_origins: parse_origins(
                &lookup("FRONTEND_ORIGINS").unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string()),
            ),
            enable_hsts: lookup("ENABLE_HSTS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        };

        Ok(config)
    }
}

/// At most [`MAX_RECOMMENDATIONS`]; lower values shorten the list.
fn parse_max_recommendations(value: Option<String>) -> Result<usize> {
    let Some(value) = value else {
        return Ok(MAX_RECOMMENDATIONS);
    };
    let max: usize = value
        .trim()
        .parse()
        .context("MAX_RECOMMENDATIONS must be a non-negative integer")?;
    if max > MAX_RECOMMENDATIONS {
        bail!("MAX_RECOMMENDATIONS must be at most {MAX_RECOMMENDATIONS}, got {max}");
    }
    Ok(max)
}

/// Comma-separated list; blanks are dropped.
fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
