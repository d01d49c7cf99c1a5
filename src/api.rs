use std::{collections::HashMap, fmt::Display, sync::Arc};

use anyhow::{Error, Result};
use axum::{
    Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::{
    clients::health::HealthChecker,
    config::Config,
    engine::{replace_variables, unresolved_variables, validate::ValidationSummary},
    editor::ContentAnalysis,
    models::{
        health::HealthStatus,
        quota::{QuotaSnapshot, QuotaSummary},
        response::ApiResponse,
        template::VariableDefinition,
    },
};

pub struct AppState {
    health_checker: HealthChecker,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            health_checker: HealthChecker::new(config)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub variables: Vec<VariableDefinition>,

    #[serde(flatten)]
    pub validation: ValidationSummary,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub content: String,

    #[serde(default)]
    pub values: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub result: String,
    pub unresolved: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuotaQuery {
    pub count: usize,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/templates/analyze", post(analyze_template))
        .route("/api/v1/templates/render", post(render_template))
        .route("/api/v1/quota", get(quota_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_api_server(config: Config) -> Result<(), Error> {
    let state = Arc::new(AppState::new(&config)?);
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "Template API server started");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_checker.check_all().await;

    let status_code = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Malformed requests get the same envelope as every other response.
fn bad_request(rejection: impl Display) -> Response {
    warn!(error = %rejection, "Rejected malformed request");

    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(rejection.to_string(), "Invalid request")),
    )
        .into_response()
}

async fn analyze_template(payload: Result<Json<AnalyzeRequest>, JsonRejection>) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection),
    };

    let analysis = ContentAnalysis::of(&request.content);

    debug!(
        variables = analysis.variables.len(),
        is_valid = analysis.report.is_valid,
        "Template content analyzed"
    );

    let message = if analysis.report.is_valid {
        "Template content is valid"
    } else {
        "Template content has errors"
    };

    let response = AnalyzeResponse {
        validation: ValidationSummary::from(&analysis.report),
        variables: analysis.variables,
    };

    Json(ApiResponse::success(response, message)).into_response()
}

async fn render_template(payload: Result<Json<RenderRequest>, JsonRejection>) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection),
    };

    let result = replace_variables(&request.content, &request.values);
    let unresolved = unresolved_variables(&request.content, &request.values)
        .into_iter()
        .map(str::to_string)
        .collect();

    Json(ApiResponse::success(
        RenderResponse { result, unresolved },
        "Template rendered",
    ))
    .into_response()
}

async fn quota_status(query: Result<Query<QuotaQuery>, QueryRejection>) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_request(rejection),
    };

    let snapshot = QuotaSnapshot::for_count(query.count);
    let message = snapshot.message();

    Json(ApiResponse::success(QuotaSummary::from(snapshot), message)).into_response()
}
