//! Incident notification ingress.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use nics_processors_core::ProcessReport;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::handlers::ErrorResponse;
use crate::state::AppState;

/// POST /api/v1/notifications/{routing_key}
///
/// Hand an incident notification to the room provisioner. Processing
/// failures are reported in the outcome; the notification is always
/// accepted once a provisioner is configured.
pub async fn process_notification(
    State(state): State<Arc<AppState>>,
    Path(routing_key): Path<String>,
    body: String,
) -> Result<(StatusCode, Json<ProcessReport>), impl IntoResponse> {
    let provisioner = match state.provisioner() {
        Some(p) => Arc::clone(p),
        None => {
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "Room provisioner not configured".to_string(),
                }),
            ))
        }
    };

    let message_id = Uuid::new_v4();
    let span = info_span!(
        "notification",
        message_id = %message_id,
        routing_key = %routing_key
    );

    let report = provisioner
        .process(&routing_key, &body)
        .instrument(span)
        .await;

    Ok((StatusCode::ACCEPTED, Json(report)))
}
