use std::sync::Arc;
use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::handlers::store_error_reply;
use crate::models::{ErrorResponse, SaveDocumentRequest, SaveDocumentResponse};
use crate::state::AppState;

/// Save a document: primary copy plus a new snapshot
pub async fn doc_save(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveDocumentRequest>,
) -> Result<(StatusCode, Json<SaveDocumentResponse>), (StatusCode, Json<ErrorResponse>)> {
    info!("Save requested for '{}' ({} bytes)", request.filename, request.content.len());

    let snapshot = state
        .store
        .save(&request.filename, &request.content)
        .await
        .map_err(|e| store_error_reply(&e))?;

    Ok((
        StatusCode::OK,
        Json(SaveDocumentResponse {
            ok: true,
            version: snapshot.version,
            timestamp: snapshot.timestamp,
        }),
    ))
}
