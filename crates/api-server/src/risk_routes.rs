use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use decision_engine::{RecommendResponse, ScoreResponse, UncertaintyResponse};
use risk_core::RiskError;
use serde::Serialize;

use crate::student_input::StudentInput;
use crate::{AppError, AppState};

/// Map RiskError to AppError. Everything reaching here came out of the
/// scorer, so it is a server-side failure.
fn risk_err(context: &str, e: RiskError) -> AppError {
    AppError::with_status(
        StatusCode::INTERNAL_SERVER_ERROR,
        anyhow::anyhow!("{context}: {e}"),
    )
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

pub fn risk_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/predict", post(predict))
        .route("/uncertainty", post(uncertainty))
        .route("/recommend", post(recommend))
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "Risk"
)]
pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Point risk probability.
#[utoipa::path(
    post,
    path = "/predict",
    request_body = StudentInput,
    responses(
        (status = 200, description = "Risk probability rounded to 4 decimals", body = ScoreResponse),
        (status = 422, description = "Missing or non-numeric required field")
    ),
    tag = "Risk"
)]
pub(crate) async fn predict(
    State(state): State<AppState>,
    Json(input): Json<StudentInput>,
) -> Result<Json<ScoreResponse>, AppError> {
    let response = state
        .engine
        .score(&input.to_raw_features())
        .map_err(|e| risk_err("Scoring failed", e))?;
    Ok(Json(response))
}

/// Conformal prediction set and uncertainty label.
#[utoipa::path(
    post,
    path = "/uncertainty",
    request_body = StudentInput,
    responses(
        (status = 200, description = "Prediction set and uncertainty level", body = UncertaintyResponse),
        (status = 422, description = "Missing or non-numeric required field")
    ),
    tag = "Risk"
)]
pub(crate) async fn uncertainty(
    State(state): State<AppState>,
    Json(input): Json<StudentInput>,
) -> Result<Json<UncertaintyResponse>, AppError> {
    let response = state
        .engine
        .classify_uncertainty(&input.to_raw_features())
        .map_err(|e| risk_err("Uncertainty evaluation failed", e))?;
    Ok(Json(response))
}

/// Up to five single-feature changes that lower predicted risk.
#[utoipa::path(
    post,
    path = "/recommend",
    request_body = StudentInput,
    responses(
        (status = 200, description = "Baseline risk and ranked recommendations", body = RecommendResponse),
        (status = 422, description = "Missing or non-numeric required field")
    ),
    tag = "Risk"
)]
pub(crate) async fn recommend(
    State(state): State<AppState>,
    Json(input): Json<StudentInput>,
) -> Result<Json<RecommendResponse>, AppError> {
    let response = state
        .engine
        .recommend(&input.to_raw_features())
        .map_err(|e| risk_err("Recommendation search failed", e))?;
    tracing::info!(
        baseline = response.baseline_risk,
        count = response.recommendations.len(),
        "recommendations computed"
    );
    Ok(Json(response))
}
