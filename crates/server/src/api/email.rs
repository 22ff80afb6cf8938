//! Email notification ingress.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use nics_processors_core::DispatchReport;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::handlers::ErrorResponse;
use crate::state::AppState;

/// POST /api/v1/email
///
/// Send an email notification. The body is either a simple JSON email or an
/// XML email document.
pub async fn dispatch_email(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<(StatusCode, Json<DispatchReport>), impl IntoResponse> {
    let Some(dispatcher) = state.dispatcher().cloned() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Email dispatcher not configured".to_string(),
            }),
        ));
    };

    let span = info_span!("email", message_id = %Uuid::new_v4());
    let report = dispatcher.dispatch(&body).instrument(span).await;

    Ok((StatusCode::ACCEPTED, Json(report)))
}
