use std::io;
use std::path::PathBuf;

use tokio::fs;
use tracing::{error, info};

use crate::models::ChatHistory;
use crate::services::doc_store_service::StoreError;

/// Chat history saved on request by a client, kept as a single JSON file.
pub struct ChatHistoryStore {
    path: PathBuf,
}

impl ChatHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn save(&self, messages: Vec<String>) -> Result<(), StoreError> {
        let history = ChatHistory { messages };
        let bytes = serde_json::to_vec_pretty(&history).map_err(|e| StoreError::Persistence(io::Error::other(e)))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(StoreError::Persistence)?;
        }
        fs::write(&self.path, bytes).await.map_err(|e| {
            error!("Failed to save chat history to {}: {}", self.path.display(), e);
            StoreError::Persistence(e)
        })?;
        info!("Saved {} chat messages", history.messages.len());
        Ok(())
    }

    pub async fn load(&self) -> Result<ChatHistory, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::NotFound("chat history".to_string())),
            Err(e) => return Err(StoreError::Persistence(e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt(format!("{}: {}", self.path.display(), e)))
    }
}
