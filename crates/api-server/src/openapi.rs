use axum::Router;
use conformal_evaluator::{PredictionSet, UncertaintyLevel};
use counterfactual_recommender::{Recommendation, RecommendationSet};
use decision_engine::{ScoreResponse, UncertaintyResponse};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::risk_routes::{self, HealthResponse};
use crate::student_input::StudentInput;
use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Student Performance Predictor API",
        description = "Risk probability, conformal uncertainty and counterfactual recommendations"
    ),
    paths(
        risk_routes::health,
        risk_routes::predict,
        risk_routes::uncertainty,
        risk_routes::recommend,
    ),
    components(schemas(
        StudentInput,
        HealthResponse,
        ScoreResponse,
        UncertaintyResponse,
        PredictionSet,
        UncertaintyLevel,
        RecommendationSet,
        Recommendation,
    )),
    tags((name = "Risk", description = "Risk decision endpoints"))
)]
pub struct ApiDoc;

/// `GET /openapi.json` and the Swagger UI under `/docs`.
pub fn openapi_routes() -> Router<AppState> {
    Router::new().merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}
