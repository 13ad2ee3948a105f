use std::sync::Arc;
use axum::{extract::State, http::StatusCode, Json};

use crate::models::{ChangeLogResponse, ErrorResponse};
use crate::state::AppState;

/// Recent change-log entries, oldest first
pub async fn change_log(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ChangeLogResponse>), (StatusCode, Json<ErrorResponse>)> {
    let entries = state
        .relay
        .change_log()
        .await
        .map_err(|e| ErrorResponse::reply(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;
    Ok((StatusCode::OK, Json(ChangeLogResponse { entries })))
}
