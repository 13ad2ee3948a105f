use std::sync::Arc;
use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, warn};

use crate::models::{ErrorResponse, LoginRequest, LoginResponse};
use crate::services::user_service::UserLookupError;
use crate::state::AppState;

/// Resolve a user by email. Credentials are not checked.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), (StatusCode, Json<ErrorResponse>)> {
    if request.email.trim().is_empty() {
        return Err(ErrorResponse::reply(StatusCode::BAD_REQUEST, "Email required"));
    }

    match state.users.lookup_user(&request.email).await {
        Ok(user) => {
            info!("User '{}' logged in", user.name);
            Ok((StatusCode::OK, Json(LoginResponse { success: true, user })))
        }
        Err(e @ UserLookupError::NotFound(_)) => {
            warn!("Login rejected: {}", e);
            Err(ErrorResponse::reply(StatusCode::UNAUTHORIZED, e.to_string()))
        }
        Err(e @ UserLookupError::Unavailable(_)) => {
            Err(ErrorResponse::reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
