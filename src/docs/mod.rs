use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Save a document and append a snapshot
#[utoipa::path(
    post,
    path = "/api/save_doc",
    request_body = SaveDocumentRequest,
    responses(
        (status = 200, description = "Document and snapshot written", body = SaveDocumentResponse),
        (status = 400, description = "Invalid document name", body = ErrorResponse),
        (status = 500, description = "Failed or degraded save", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_save_doc() {}

/// Open a saved document
#[utoipa::path(
    get,
    path = "/api/open_doc/{name}",
    params(("name" = String, Path, description = "Document name")),
    responses(
        (status = 200, description = "Saved content", body = OpenDocumentResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_open_doc() {}

/// List saved documents
#[utoipa::path(
    get,
    path = "/api/list_docs",
    responses(
        (status = 200, description = "Document names", body = ListDocumentsResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_list_doc() {}

/// Version history of a document
#[utoipa::path(
    get,
    path = "/api/doc_versions/{name}",
    params(("name" = String, Path, description = "Document name")),
    responses(
        (status = 200, description = "Snapshots, oldest first", body = DocumentVersionsResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_versions_doc() {}

/// Publish a chat message to every connection
#[utoipa::path(
    post,
    path = "/api/message",
    request_body = PublishMessageRequest,
    responses(
        (status = 200, description = "Message queued to all connections", body = PublishMessageResponse),
        (status = 400, description = "Empty message or not a chat envelope", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn publish_message_doc() {}

/// Save chat history
#[utoipa::path(
    post,
    path = "/api/save_hist",
    request_body = SaveHistoryRequest,
    responses(
        (status = 200, description = "History saved", body = SaveHistoryResponse),
        (status = 400, description = "Messages missing", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn save_history_doc() {}

/// Recent change-log entries
#[utoipa::path(
    get,
    path = "/api/changelog",
    responses(
        (status = 200, description = "Change-log window", body = ChangeLogResponse)
    )
)]
#[allow(dead_code)]
pub async fn change_log_doc() {}

/// Look up a user by email
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Known user", body = LoginResponse),
        (status = 400, description = "Email missing", body = ErrorResponse),
        (status = 401, description = "Unknown user", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn login_doc() {}

/// Relay and host diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Diagnostics", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        doc_save_doc,
        doc_open_doc,
        doc_list_doc,
        doc_versions_doc,
        publish_message_doc,
        save_history_doc,
        change_log_doc,
        login_doc,
        diagnostics_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            SaveDocumentRequest,
            SaveDocumentResponse,
            OpenDocumentResponse,
            ListDocumentsResponse,
            Snapshot,
            DocumentVersionsResponse,
            PublishMessageRequest,
            PublishMessageResponse,
            SaveHistoryRequest,
            SaveHistoryResponse,
            ChangeLogEntry,
            ChangeLogResponse,
            User,
            LoginRequest,
            LoginResponse,
            DiagnosticsResponse,
        )
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
