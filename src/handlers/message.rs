use std::sync::Arc;
use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, info};

use crate::models::{Envelope, ErrorResponse, PublishMessageRequest, PublishMessageResponse};
use crate::state::AppState;

/// Publish a chat message to every connected client
///
/// The message may be plain text or an already encoded chat envelope.
pub async fn publish_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PublishMessageRequest>,
) -> Result<(StatusCode, Json<PublishMessageResponse>), (StatusCode, Json<ErrorResponse>)> {
    if request.message.is_empty() {
        return Err(ErrorResponse::reply(StatusCode::BAD_REQUEST, "Empty message"));
    }

    let envelope = match Envelope::decode(&request.message) {
        Ok(Envelope::Chat(text)) => Envelope::Chat(text),
        Ok(other) => {
            return Err(ErrorResponse::reply(
                StatusCode::BAD_REQUEST,
                format!("Only chat messages can be published, got '{}'", other.kind()),
            ));
        }
        Err(_) => Envelope::Chat(request.message),
    };

    state.relay.publish(envelope).map_err(|e| {
        error!("Failed to publish chat message: {}", e);
        ErrorResponse::reply(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
    })?;
    info!("Chat message published");

    Ok((StatusCode::OK, Json(PublishMessageResponse { sent: true })))
}
