pub mod api;

use std::sync::Arc;
use axum::{http::HeaderValue, routing::{get, post}, Router};
use tower_http::{cors::{AllowOrigin, Any, CorsLayer}, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{docs::ApiDoc, handlers::login, state::AppState, websocket::websocket_handler};
use api::create_api_routes;

/// Build the complete application: WebSocket relay, login, API and Swagger UI
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_origin_list());

    Router::<Arc<AppState>>::new()
        .route("/", get(websocket_handler))
        .route("/ws", get(websocket_handler))
        .route("/login", post(login))
        .nest("/api", create_api_routes())
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: Option<Vec<String>>) -> CorsLayer {
    let Some(origins) = origins else {
        return CorsLayer::permissive();
    };
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
