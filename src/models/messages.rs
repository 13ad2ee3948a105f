use serde::{Deserialize, Serialize};

/// A typed message exchanged over a live connection.
///
/// On the wire this is `{ "type": <tag>, "payload": <string> }`. Unknown tags
/// and non-string payloads fail to decode and are treated as malformed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum Envelope {
    #[serde(rename = "message")]
    Chat(String),
    #[serde(rename = "editor")]
    ContentSync(String),
    #[serde(rename = "log")]
    ChangeLog(String),
    #[serde(rename = "editing")]
    PresenceJoin(String),
    #[serde(rename = "FileEditorDelete")]
    PresenceLeave(String),
}

impl Envelope {
    /// Decode an inbound text frame.
    pub fn decode(text: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(text).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    /// Encode for an outbound text frame.
    pub fn encode(&self) -> String {
        // Every variant carries a plain string, serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Wire tag of this envelope, used for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Chat(_) => "message",
            Envelope::ContentSync(_) => "editor",
            Envelope::ChangeLog(_) => "log",
            Envelope::PresenceJoin(_) => "editing",
            Envelope::PresenceLeave(_) => "FileEditorDelete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    Malformed(String),
}

impl std::fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvelopeError::Malformed(e) => write!(f, "Malformed envelope: {}", e),
        }
    }
}

impl std::error::Error for EnvelopeError {}
