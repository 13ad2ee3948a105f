use std::sync::Arc;
use axum::{extract::{Path, State}, http::StatusCode, Json};

use crate::handlers::store_error_reply;
use crate::models::{ErrorResponse, OpenDocumentResponse};
use crate::state::AppState;

/// Open the saved copy of a document
pub async fn doc_open(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<OpenDocumentResponse>), (StatusCode, Json<ErrorResponse>)> {
    let content = state.store.open(&name).await.map_err(|e| store_error_reply(&e))?;
    Ok((StatusCode::OK, Json(OpenDocumentResponse { content })))
}
