use std::sync::Arc;
use axum::{extract::{Path, State}, http::StatusCode, Json};

use crate::handlers::store_error_reply;
use crate::models::{DocumentVersionsResponse, ErrorResponse};
use crate::state::AppState;

/// Get every saved version of a document, oldest first
pub async fn doc_versions(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<DocumentVersionsResponse>), (StatusCode, Json<ErrorResponse>)> {
    let versions = state.store.history(&name).await.map_err(|e| store_error_reply(&e))?;
    Ok((StatusCode::OK, Json(DocumentVersionsResponse { name, versions })))
}
