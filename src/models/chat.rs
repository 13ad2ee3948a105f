use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request for publishing a chat message to every connection
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct PublishMessageRequest {
    #[serde(default)]
    pub message: String,
}

/// Response for a published chat message
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct PublishMessageResponse {
    pub sent: bool,
}

/// Saved chat history, as stored on disk.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatHistory {
    #[serde(alias = "mensajes")]
    pub messages: Vec<String>,
}

/// Request for saving chat history
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct SaveHistoryRequest {
    #[serde(alias = "mensajes")]
    pub messages: Option<Vec<String>>,
}

/// Response for saving chat history
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct SaveHistoryResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct HistoryQuery {
    pub format: Option<String>,
}
