use crate::{handlers::*, state::AppState};
use axum::{routing::{get, post}, Router};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes() -> Router<Arc<AppState>> {
    Router::<Arc<AppState>>::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/save_doc", post(doc_save))
        .route("/open_doc/:name", get(doc_open))
        .route("/list_docs", get(doc_list))
        .route("/doc_versions/:name", get(doc_versions))
        .route("/export_doc", get(doc_export))
        .route("/message", post(publish_message))
        .route("/save_hist", post(save_history))
        .route("/view_hist", get(view_history))
        .route("/changelog", get(change_log))
        .route("/v1/diagnostics", get(diagnostics))
}
