use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A human-readable record of a change, kept in a rolling window.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
pub struct ChangeLogEntry {
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// Response for the change-log window
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ChangeLogResponse {
    pub entries: Vec<ChangeLogEntry>,
}
