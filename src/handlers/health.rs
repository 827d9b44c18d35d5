use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::lifecycle::Phase;
use crate::{NotebookError, server::router::NotebookState};

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub phase: Phase,
    pub administrators: i64,
}

/// GET /healthz -> 200 once serving, 503 otherwise. Always round-trips the database.
pub async fn health_handler(
    State(state): State<NotebookState>,
) -> Result<(StatusCode, Json<HealthReport>), NotebookError> {
    let administrators = state.storage.count().await?;
    let phase = *state.phase.borrow();

    let (code, status) = if phase == Phase::Serving {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };
    Ok((
        code,
        Json(HealthReport {
            status,
            phase,
            administrators,
        }),
    ))
}
