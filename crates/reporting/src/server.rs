//! Read-only HTTP views of an insights artifact.

use crate::html::render_html;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use insights_core::config::ReportConfig;
use insights_core::InsightsArtifact;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state for the report handlers. The report is rendered once.
#[derive(Clone)]
pub struct ReportState {
    pub artifact: Arc<InsightsArtifact>,
    pub html: Arc<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub run_id: String,
    pub degraded: usize,
}

/// Serves one artifact over HTTP. Nothing the server exposes can change it.
pub struct ReportServer {
    config: ReportConfig,
    state: ReportState,
}

impl ReportServer {
    pub fn new(artifact: InsightsArtifact, config: ReportConfig) -> Self {
        let html = render_html(&artifact, &config);
        Self {
            config,
            state: ReportState {
                artifact: Arc::new(artifact),
                html: Arc::new(html),
            },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(report))
            .route("/api/insights", get(insights))
            .route("/api/insights/:section", get(section))
            .route("/health", get(health))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    pub async fn serve(&self) -> anyhow::Result<()> {
        let addr = SocketAddr::new(self.config.host.parse()?, self.config.port);
        info!(addr = %addr, run_id = %self.state.artifact.metadata.run_id, "Starting report server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// GET /
///
/// The HTML report.
async fn report(State(state): State<ReportState>) -> Html<String> {
    Html(state.html.as_ref().clone())
}

/// GET /api/insights
async fn insights(State(state): State<ReportState>) -> Json<InsightsArtifact> {
    Json(state.artifact.as_ref().clone())
}

/// GET /api/insights/:section
///
/// One section; `null` when it is absent.
async fn section(
    State(state): State<ReportState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    match state.artifact.section(&name) {
        Some(value) => Ok(Json(value)),
        None => {
            warn!(section = %name, "Unknown section requested");
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "unknown_section".to_string(),
                    message: format!(
                        "'{name}' is not a section; expected one of {}",
                        InsightsArtifact::SECTIONS.join(", ")
                    ),
                }),
            ))
        }
    }
}

/// GET /health
async fn health(State(state): State<ReportState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        run_id: state.artifact.metadata.run_id.to_string(),
        degraded: state.artifact.degraded.len(),
    })
}
