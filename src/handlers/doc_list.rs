use std::sync::Arc;
use axum::{extract::State, http::StatusCode, Json};

use crate::handlers::store_error_reply;
use crate::models::{ErrorResponse, ListDocumentsResponse};
use crate::state::AppState;

/// List saved documents
pub async fn doc_list(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ListDocumentsResponse>), (StatusCode, Json<ErrorResponse>)> {
    let files = state.store.list().await.map_err(|e| store_error_reply(&e))?;
    Ok((StatusCode::OK, Json(ListDocumentsResponse { files })))
}
