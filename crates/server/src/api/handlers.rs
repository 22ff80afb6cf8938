use axum::{extract::State, http::header, response::IntoResponse, Json};
use nics_processors_core::SanitizedConfig;
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub provisioner: bool,
    pub email: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        provisioner: state.provisioner().is_some(),
        email: state.dispatcher().is_some(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
