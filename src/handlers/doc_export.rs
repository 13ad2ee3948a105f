use std::sync::Arc;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::models::{ErrorResponse, ExportQuery};
use crate::state::AppState;

/// Export the live document content
pub async fn doc_export(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Response {
    let format = query.format.as_deref().map(str::trim).unwrap_or("txt").to_lowercase();
    match format.as_str() {
        "txt" | "" => {
            let content = state.store.current_content();
            debug!("Exporting current content ({} bytes)", content.len());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                    (header::CONTENT_DISPOSITION, "attachment; filename=documento.txt"),
                ],
                content,
            )
                .into_response()
        }
        "pdf" => {
            warn!("PDF export requested but not available");
            ErrorResponse::reply(StatusCode::NOT_IMPLEMENTED, "PDF export is not available").into_response()
        }
        other => ErrorResponse::reply(
            StatusCode::BAD_REQUEST,
            format!("Invalid export format '{}'. Use 'txt' or 'pdf'.", other),
        )
        .into_response(),
    }
}
