use std::sync::Arc;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use crate::handlers::store_error_reply;
use crate::models::{ErrorResponse, HistoryQuery, SaveHistoryRequest, SaveHistoryResponse};
use crate::state::AppState;

/// Save the chat history sent by a client
pub async fn save_history(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveHistoryRequest>,
) -> Result<(StatusCode, Json<SaveHistoryResponse>), (StatusCode, Json<ErrorResponse>)> {
    let messages = request.messages.ok_or_else(|| {
        ErrorResponse::reply(StatusCode::BAD_REQUEST, "Invalid format: expected an array of messages")
    })?;

    state.history.save(messages).await.map_err(|e| store_error_reply(&e))?;

    Ok((StatusCode::OK, Json(SaveHistoryResponse {
        success: true,
        message: "History saved".to_string(),
    })))
}

/// Download the saved chat history as JSON or plain text
pub async fn view_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let history = match state.history.load().await {
        Ok(history) => history,
        Err(e) => return store_error_reply(&e).into_response(),
    };

    if query.format.as_deref() == Some("txt") {
        return (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=historial.txt"),
            ],
            history.messages.join("\n"),
        )
            .into_response();
    }

    match serde_json::to_string_pretty(&history) {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json"),
                (header::CONTENT_DISPOSITION, "attachment; filename=historial.json"),
            ],
            body,
        )
            .into_response(),
        Err(e) => ErrorResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
