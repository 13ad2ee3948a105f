use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::models::{ChangeLogEntry, Envelope};
use crate::services::doc_store_service::DocumentStore;
use crate::ws::changelog::ChangeLog;
use crate::ws::presence::{PresenceExpiry, PresenceTracker};
use crate::ws::registry::{Connection, ConnectionId, ConnectionRegistry};

#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub presence_idle: Duration,
    pub change_log_capacity: usize,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            presence_idle: Duration::from_secs(5),
            change_log_capacity: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayStats {
    pub connections: usize,
    pub active_editors: Vec<String>,
    pub change_log_len: usize,
}

#[derive(Debug)]
pub enum RelayError {
    Closed,
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::Closed => write!(f, "Relay is not running"),
        }
    }
}

impl std::error::Error for RelayError {}

/// Work items queued to the relay task.
#[derive(Debug)]
pub enum RelayCommand {
    Register(Connection),
    Unregister(ConnectionId),
    Inbound { source: ConnectionId, text: String },
    Publish(Envelope),
    Stats(oneshot::Sender<RelayStats>),
    ChangeLog(oneshot::Sender<Vec<ChangeLogEntry>>),
}

/// Owns every piece of shared live state: the connection set, presence,
/// the change-log window and (through the store) the current content.
///
/// All mutations happen on the single relay task, one command at a time.
pub struct Relay {
    store: Arc<DocumentStore>,
    registry: ConnectionRegistry,
    presence: PresenceTracker,
    change_log: ChangeLog,
}

impl Relay {
    pub fn new(store: Arc<DocumentStore>, settings: &RelaySettings) -> (Self, mpsc::UnboundedReceiver<PresenceExpiry>) {
        let (presence, expiries) = PresenceTracker::new(settings.presence_idle);
        let relay = Self {
            store,
            registry: ConnectionRegistry::new(),
            presence,
            change_log: ChangeLog::new(settings.change_log_capacity),
        };
        (relay, expiries)
    }

    /// Start the relay task. It stops once every handle has been dropped.
    pub fn spawn(store: Arc<DocumentStore>, settings: &RelaySettings) -> RelayHandle {
        let (relay, expiries) = Relay::new(store, settings);
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(relay.run(rx, expiries));
        RelayHandle { commands }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<RelayCommand>,
        mut expiries: mpsc::UnboundedReceiver<PresenceExpiry>,
    ) {
        info!("Relay started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(expiry) = expiries.recv() => self.on_presence_expired(expiry),
            }
        }
        info!("Relay stopped, {} connections dropped", self.registry.len());
    }

    pub fn handle(&mut self, command: RelayCommand) {
        match command {
            RelayCommand::Register(conn) => self.register(conn),
            RelayCommand::Unregister(id) => self.unregister(id),
            RelayCommand::Inbound { source, text } => self.on_text(source, &text),
            RelayCommand::Publish(envelope) => self.publish(envelope),
            RelayCommand::Stats(reply) => {
                let _ = reply.send(self.stats());
            }
            RelayCommand::ChangeLog(reply) => {
                let _ = reply.send(self.change_log.entries());
            }
        }
    }

    pub fn register(&mut self, conn: Connection) {
        let content = self.store.current_content();
        self.registry.register(conn, &content);
    }

    /// Presence is activity driven: a disconnect leaves the user's idle timer running.
    pub fn unregister(&mut self, id: ConnectionId) {
        self.registry.unregister(id);
    }

    pub fn on_text(&mut self, source: ConnectionId, text: &str) {
        match Envelope::decode(text) {
            Ok(envelope) => self.on_envelope(source, envelope),
            Err(e) => warn!("Dropping message from connection {}: {}", source, e),
        }
    }

    pub fn on_envelope(&mut self, source: ConnectionId, envelope: Envelope) {
        debug!("'{}' from connection {}", envelope.kind(), source);
        match &envelope {
            Envelope::Chat(_) => {
                self.registry.broadcast(&envelope, Some(source));
            }
            Envelope::ContentSync(content) => {
                self.store.set_current_content(content.clone());
                self.registry.broadcast(&envelope, Some(source));
                if let Some(name) = self.registry.user_of(source).map(str::to_string) {
                    self.record_activity(&name);
                }
            }
            Envelope::ChangeLog(description) => {
                self.change_log.push(description.clone());
                self.registry.broadcast(&envelope, Some(source));
            }
            Envelope::PresenceJoin(name) => {
                let name = name.trim();
                if name.is_empty() {
                    warn!("Dropping presence signal without a name from connection {}", source);
                    return;
                }
                self.registry.bind_user(source, name);
                self.record_activity(name);
            }
            Envelope::PresenceLeave(name) => {
                debug!("Ignoring client-sent presence leave for '{}' from connection {}", name, source);
            }
        }
    }

    pub fn on_presence_expired(&mut self, expiry: PresenceExpiry) {
        if let Some(leave) = self.presence.expire(expiry) {
            self.registry.broadcast(&leave, None);
        }
    }

    /// Deliver to every connection, e.g. chat posted over HTTP.
    pub fn publish(&mut self, envelope: Envelope) {
        let delivered = self.registry.broadcast(&envelope, None);
        debug!("Published '{}' to {} connections", envelope.kind(), delivered);
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            connections: self.registry.len(),
            active_editors: self.presence.active_names(),
            change_log_len: self.change_log.len(),
        }
    }

    fn record_activity(&mut self, name: &str) {
        if let Some(join) = self.presence.record_activity(name) {
            self.registry.broadcast(&join, None);
        }
    }
}

/// Cheap, cloneable access to a running relay.
#[derive(Clone, Debug)]
pub struct RelayHandle {
    commands: mpsc::UnboundedSender<RelayCommand>,
}

impl RelayHandle {
    /// Register a new connection and get the queue its writer should drain.
    pub fn register(&self, user: Option<String>) -> Result<(ConnectionId, mpsc::UnboundedReceiver<Envelope>), RelayError> {
        let (conn, outbound) = Connection::new(user);
        let id = conn.id;
        self.send(RelayCommand::Register(conn))?;
        Ok((id, outbound))
    }

    pub fn unregister(&self, id: ConnectionId) {
        if self.send(RelayCommand::Unregister(id)).is_err() {
            debug!("Relay already stopped while unregistering {}", id);
        }
    }

    pub fn inbound(&self, source: ConnectionId, text: String) -> Result<(), RelayError> {
        self.send(RelayCommand::Inbound { source, text })
    }

    pub fn publish(&self, envelope: Envelope) -> Result<(), RelayError> {
        self.send(RelayCommand::Publish(envelope))
    }

    pub async fn stats(&self) -> Result<RelayStats, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.send(RelayCommand::Stats(reply))?;
        rx.await.map_err(|_| RelayError::Closed)
    }

    pub async fn change_log(&self) -> Result<Vec<ChangeLogEntry>, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.send(RelayCommand::ChangeLog(reply))?;
        rx.await.map_err(|_| RelayError::Closed)
    }

    fn send(&self, command: RelayCommand) -> Result<(), RelayError> {
        self.commands.send(command).map_err(|_| RelayError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    struct Fixture {
        relay: Relay,
        expiries: mpsc::UnboundedReceiver<PresenceExpiry>,
        store: Arc<DocumentStore>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DocumentStore::new(dir.path()));
        let (relay, expiries) = Relay::new(store.clone(), &RelaySettings::default());
        Fixture { relay, expiries, store, _dir: dir }
    }

    fn connect(relay: &mut Relay, user: Option<&str>) -> (ConnectionId, mpsc::UnboundedReceiver<Envelope>) {
        let (conn, rx) = Connection::new(user.map(str::to_string));
        let id = conn.id;
        relay.register(conn);
        (id, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Envelope>) -> Vec<Envelope> {
        let mut out = Vec::new();
        while let Ok(env) = rx.try_recv() {
            out.push(env);
        }
        out
    }

    #[tokio::test]
    async fn chat_reaches_everyone_but_the_sender() {
        let mut f = fixture();
        let (a, mut rx_a) = connect(&mut f.relay, None);
        let (_, mut rx_b) = connect(&mut f.relay, None);
        let (_, mut rx_c) = connect(&mut f.relay, None);

        f.relay.on_text(a, r#"{"type":"message","payload":"[10:00] Ana: hola"}"#);

        let chat = Envelope::Chat("[10:00] Ana: hola".to_string());
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(drain(&mut rx_b), vec![chat.clone()]);
        assert_eq!(drain(&mut rx_c), vec![chat]);
        assert_eq!(f.store.current_content(), "");
    }

    #[tokio::test]
    async fn late_joiner_first_sees_current_content() {
        let mut f = fixture();
        let (a, _rx_a) = connect(&mut f.relay, Some("Ana"));
        f.relay.on_text(a, r#"{"type":"editor","payload":"hello"}"#);

        let (_, mut rx_b) = connect(&mut f.relay, None);
        let first = rx_b.try_recv().unwrap();
        assert_eq!(first.encode(), r#"{"type":"editor","payload":"hello"}"#);
    }

    #[tokio::test]
    async fn content_sync_updates_store_and_fans_out() {
        let mut f = fixture();
        let (a, mut rx_a) = connect(&mut f.relay, None);
        let (_, mut rx_b) = connect(&mut f.relay, None);

        f.relay.on_envelope(a, Envelope::ContentSync("draft".to_string()));

        assert_eq!(f.store.current_content(), "draft");
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(drain(&mut rx_b), vec![Envelope::ContentSync("draft".to_string())]);
    }

    #[tokio::test]
    async fn malformed_message_is_dropped_and_connection_kept() {
        let mut f = fixture();
        let (a, _rx_a) = connect(&mut f.relay, None);
        let (_, mut rx_b) = connect(&mut f.relay, None);

        f.relay.on_text(a, "{not json");
        f.relay.on_text(a, r#"{"type":"cursor","payload":"1,2"}"#);
        f.relay.on_text(a, r#"{"type":"editor","payload":42}"#);
        assert!(drain(&mut rx_b).is_empty());
        assert_eq!(f.relay.stats().connections, 2);

        f.relay.on_text(a, r#"{"type":"message","payload":"still here"}"#);
        assert_eq!(drain(&mut rx_b), vec![Envelope::Chat("still here".to_string())]);
    }

    #[tokio::test]
    async fn change_log_is_bounded_and_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DocumentStore::new(dir.path()));
        let settings = RelaySettings { change_log_capacity: 2, ..RelaySettings::default() };
        let (mut relay, _expiries) = Relay::new(store, &settings);
        let (a, _rx_a) = connect(&mut relay, None);
        let (_, mut rx_b) = connect(&mut relay, None);

        for i in 0..3 {
            relay.on_envelope(a, Envelope::ChangeLog(format!("Ana changed {i}")));
        }

        assert_eq!(drain(&mut rx_b).len(), 3);
        let kept: Vec<_> = relay.change_log.entries().into_iter().map(|e| e.description).collect();
        assert_eq!(kept, vec!["Ana changed 1", "Ana changed 2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn edits_produce_one_join_and_one_leave_for_everyone() {
        let mut f = fixture();
        let (a, mut rx_a) = connect(&mut f.relay, Some("Ana"));
        let (_, mut rx_b) = connect(&mut f.relay, None);

        for text in ["h", "he", "hel"] {
            f.relay.on_envelope(a, Envelope::ContentSync(text.to_string()));
        }
        assert_eq!(drain(&mut rx_a), vec![Envelope::PresenceJoin("Ana".to_string())]);
        let seen_by_b = drain(&mut rx_b);
        assert_eq!(seen_by_b.iter().filter(|e| matches!(e, Envelope::PresenceJoin(_))).count(), 1);
        assert_eq!(f.relay.stats().active_editors, vec!["Ana".to_string()]);

        let expiry = timeout(Duration::from_secs(10), f.expiries.recv()).await.unwrap().unwrap();
        f.relay.on_presence_expired(expiry);

        let leave = Envelope::PresenceLeave("Ana".to_string());
        assert_eq!(drain(&mut rx_a), vec![leave.clone()]);
        assert_eq!(drain(&mut rx_b), vec![leave]);
        assert!(f.relay.stats().active_editors.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn editing_signal_names_an_anonymous_connection() {
        let mut f = fixture();
        let (a, mut rx_a) = connect(&mut f.relay, None);

        f.relay.on_envelope(a, Envelope::ContentSync("x".to_string()));
        assert!(f.relay.stats().active_editors.is_empty());

        f.relay.on_text(a, r#"{"type":"editing","payload":"Ben"}"#);
        f.relay.on_envelope(a, Envelope::ContentSync("xy".to_string()));

        assert_eq!(drain(&mut rx_a), vec![Envelope::PresenceJoin("Ben".to_string())]);
        assert_eq!(f.relay.registry.user_of(a), Some("Ben"));
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_does_not_end_presence() {
        let mut f = fixture();
        let (a, _rx_a) = connect(&mut f.relay, Some("Ana"));
        let (_, mut rx_b) = connect(&mut f.relay, None);
        f.relay.on_envelope(a, Envelope::ContentSync("x".to_string()));
        drain(&mut rx_b);

        f.relay.unregister(a);
        assert!(drain(&mut rx_b).is_empty());
        assert_eq!(f.relay.stats().active_editors, vec!["Ana".to_string()]);

        let expiry = timeout(Duration::from_secs(10), f.expiries.recv()).await.unwrap().unwrap();
        f.relay.on_presence_expired(expiry);
        assert_eq!(drain(&mut rx_b), vec![Envelope::PresenceLeave("Ana".to_string())]);
    }

    #[tokio::test]
    async fn client_sent_leave_is_ignored() {
        let mut f = fixture();
        let (a, _rx_a) = connect(&mut f.relay, None);
        let (_, mut rx_b) = connect(&mut f.relay, None);

        f.relay.on_text(a, r#"{"type":"FileEditorDelete","payload":"Ana"}"#);
        assert!(drain(&mut rx_b).is_empty());
    }

    #[tokio::test]
    async fn handle_queries_round_trip_through_the_task() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DocumentStore::new(dir.path()));
        let handle = Relay::spawn(store.clone(), &RelaySettings::default());

        let (a, _rx_a) = handle.register(Some("Ana".to_string())).unwrap();
        let (_, mut rx_b) = handle.register(None).unwrap();
        handle.inbound(a, r#"{"type":"log","payload":"Ana edited"}"#.to_string()).unwrap();
        handle.publish(Envelope::Chat("from http".to_string())).unwrap();

        let stats = handle.stats().await.unwrap();
        assert_eq!(stats.connections, 2);
        assert_eq!(stats.change_log_len, 1);
        assert_eq!(handle.change_log().await.unwrap()[0].description, "Ana edited");
        assert_eq!(
            drain(&mut rx_b),
            vec![Envelope::ChangeLog("Ana edited".to_string()), Envelope::Chat("from http".to_string())]
        );

        handle.unregister(a);
        handle.unregister(a);
        assert_eq!(handle.stats().await.unwrap().connections, 1);
    }
}
