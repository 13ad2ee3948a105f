use std::sync::Arc;

use crate::config::Config;
use crate::services::doc_store_service::DocumentStore;
use crate::services::history_service::ChatHistoryStore;
use crate::services::user_service::UserDirectory;
use crate::ws::{Relay, RelayHandle};

/// Shared state handed to every route.
pub struct AppState {
    pub config: Config,
    pub store: Arc<DocumentStore>,
    pub relay: RelayHandle,
    pub users: UserDirectory,
    pub history: ChatHistoryStore,
}

impl AppState {
    /// Build the state and start the relay task. Must run inside a tokio runtime.
    pub fn new(config: Config) -> Self {
        let store = Arc::new(DocumentStore::new(&config.data_dir));
        let relay = Relay::spawn(store.clone(), &config.relay_settings());
        Self {
            store,
            relay,
            users: UserDirectory::new(config.users_path()),
            history: ChatHistoryStore::new(config.history_path()),
            config,
        }
    }
}
