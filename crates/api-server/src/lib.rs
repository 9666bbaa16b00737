//! HTTP boundary for the risk decision engine.
//!
//! Startup is all-or-nothing: if the scorer, schema, threshold or catalog
//! fail to load, `run_server` returns the error before binding a socket.

pub mod config;
mod openapi;
mod request_id;
mod risk_routes;
mod security_headers;
pub mod student_input;

use anyhow::Context;
use axum::{
    body::Body,
    http::{HeaderValue, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use counterfactual_recommender::{CandidateCatalog, Recommender};
use decision_engine::DecisionEngine;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use openapi::ApiDoc;

use request_id::request_id_middleware;
use security_headers::{security_headers_middleware, SecurityHeaders};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DecisionEngine>,
}

/// Handler error: an HTTP status plus the underlying cause.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{:#}", self.error);
        } else {
            tracing::warn!(status = %self.status, "{:#}", self.error);
        }

        (
            self.status,
            Json(json!({
                "success": false,
                "error": self.error.to_string(),
            })),
        )
            .into_response()
    }
}

/// Initialize tracing. `RUST_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"))
    };

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter()).init();
    }
}

/// Load artifacts and catalog, and assemble the decision engine.
pub fn build_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let artifacts = model_artifacts::load_artifacts(&config.artifacts)
        .context("failed to load model artifacts")?;

    let catalog = match &config.catalog_path {
        Some(path) => {
            tracing::info!("Loading recommendation catalog from {}", path.display());
            model_artifacts::load_catalog(path).context("failed to load recommendation catalog")?
        }
        None => CandidateCatalog::default(),
    };
    let recommender = Recommender::new(catalog).with_max_recommendations(config.max_recommendations);

    let engine = DecisionEngine::from_artifacts(artifacts, recommender)
        .context("failed to initialize decision engine")?;

    Ok(AppState {
        engine: Arc::new(engine),
    })
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let values = origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{o}'"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Full application router with middleware.
pub fn build_router(state: AppState, config: &ServerConfig) -> anyhow::Result<Router> {
    let security = SecurityHeaders {
        enable_hsts: config.enable_hsts,
    };

    let router = Router::new()
        .merge(risk_routes::risk_routes())
        .merge(openapi::openapi_routes())
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            security,
            security_headers_middleware,
        ))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(cors_layer(&config.frontend_origins)?);

    Ok(router)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        "Starting risk decision API (bind={}, origins={:?})",
        config.bind_addr,
        config.frontend_origins
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
