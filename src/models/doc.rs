use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request for saving a document
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct SaveDocumentRequest {
    pub filename: String,
    pub content: String,
}

/// Response for a successful save
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct SaveDocumentResponse {
    pub ok: bool,
    pub version: u32,
    pub timestamp: DateTime<Utc>,
}

/// Response for opening a document
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct OpenDocumentResponse {
    pub content: String,
}

/// Response for listing documents
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ListDocumentsResponse {
    pub files: Vec<String>,
}

/// An immutable, timestamped copy of a document's content.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

/// Response for a document's version history
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct DocumentVersionsResponse {
    pub name: String,
    pub versions: Vec<Snapshot>,
}

#[derive(Deserialize, Debug)]
pub struct ExportQuery {
    pub format: Option<String>,
}
