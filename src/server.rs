// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! HTTP service exposing graph building and prerequisite extraction

use crate::builder::{Diagnostic, GraphBuilder};
use crate::types::CourseGraph;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Build-level failures; the only errors a client ever sees
#[derive(Debug, Error)]
pub enum ApiError {
    /// The graph request could not be served
    #[error("Failed to build course graph")]
    BuildFailed(String),

    /// The extraction request could not be served
    #[error("Failed to parse prerequisites")]
    ParseFailed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = match &self {
            ApiError::BuildFailed(d) | ApiError::ParseFailed(d) => d,
        };
        error!("{}: {}", self, detail);

        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    builder: Arc<GraphBuilder>,
}

impl AppState {
    /// Wrap a graph builder for the handlers
    #[must_use]
    pub fn new(builder: Arc<GraphBuilder>) -> Self {
        Self { builder }
    }
}

/// Graph request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildGraphRequest {
    /// Course to start from, e.g. "CMPT 225"
    pub start_course: String,
    /// Include pruned branches in the response
    #[serde(default)]
    pub diagnostics: bool,
}

/// Graph response body
#[derive(Debug, Serialize, Deserialize)]
pub struct BuildGraphResponse {
    /// Nodes and links
    #[serde(flatten)]
    pub graph: CourseGraph,
    /// Pruned branches, only when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Vec<Diagnostic>>,
}

/// Extraction request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsePrereqsRequest {
    /// Free-text prerequisite description; anything but a string yields
    /// no courses
    #[serde(default)]
    pub prerequisite_text: serde_json::Value,
}

/// Extraction response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ParsePrereqsResponse {
    /// Candidate course codes
    pub courses: Vec<String>,
}

/// Create the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/build-graph", post(build_graph))
        .route("/api/parse-prereqs", post(parse_prereqs))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", bind, e))?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("coursegraph listening on http://{}", listener.local_addr()?);
    info!("  POST /api/build-graph  - Build a prerequisite graph");
    info!("  POST /api/parse-prereqs - Extract course codes from text");
    info!("  GET  /health           - Health check");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn build_graph(
    State(state): State<AppState>,
    payload: Result<Json<BuildGraphRequest>, JsonRejection>,
) -> Result<Json<BuildGraphResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BuildFailed(e.body_text()))?;

    let report = state.builder.build_with_report(&request.start_course).await;
    Ok(Json(BuildGraphResponse {
        graph: report.graph,
        diagnostics: request.diagnostics.then_some(report.diagnostics),
    }))
}

async fn parse_prereqs(
    State(state): State<AppState>,
    payload: Result<Json<ParsePrereqsRequest>, JsonRejection>,
) -> Result<Json<ParsePrereqsResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::ParseFailed(e.body_text()))?;

    let Some(text) = request.prerequisite_text.as_str() else {
        return Ok(Json(ParsePrereqsResponse { courses: Vec::new() }));
    };

    let courses = state
        .builder
        .extractor()
        .extract(text)
        .await
        .map_err(|e| ApiError::ParseFailed(e.to_string()))?;
    Ok(Json(ParsePrereqsResponse { courses }))
}
