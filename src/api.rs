//! REST API server for the research agent
//!
//! Exposes the orchestrator over HTTP

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::agent::Orchestrator;
use crate::models::AnalysisRequest;
use crate::Result;

const SERVICE_NAME: &str = "financial-research-agent";
const DEFAULT_PURPOSE: &str = "financial analysis";

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalyzeRequest {
    pub query: String,
    pub purpose: Option<String>,
    pub target_score: Option<u8>,
    pub max_retries: Option<u32>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub default_target_score: u8,
    pub default_max_retries: u32,
}

impl ApiState {
    fn to_analysis_request(&self, req: AnalyzeRequest) -> AnalysisRequest {
        AnalysisRequest {
            question: req.query.trim().to_string(),
            purpose: req
                .purpose
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PURPOSE.to_string()),
            target_score: req.target_score.unwrap_or(self.default_target_score),
            max_retries: req.max_retries.unwrap_or(self.default_max_retries),
        }
    }
}

/// =============================
/// Liveness Endpoints
/// =============================

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Financial research agent is running"
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Analysis Endpoint
/// =============================

async fn analyze(
    State(state): State<ApiState>,
    Json(req): Json<AnalyzeRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Query cannot be empty".into())),
        );
    }

    info!(query = %req.query, "Received analysis request");

    let request = state.to_analysis_request(req);
    let report = state.orchestrator.run(request).await;

    let response = if report.error {
        warn!(run_id = %report.run_id, "Analysis finished with error");
        ApiResponse {
            success: false,
            error: Some(report.final_answer.clone()),
            ..ApiResponse::success(&report)
        }
    } else {
        ApiResponse::success(&report)
    };

    (StatusCode::OK, Json(response))
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(state: ApiState, port: u16) -> Result<()> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
