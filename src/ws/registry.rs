use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::Envelope;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A live client channel. Envelopes pushed here are written to the socket,
/// in order, by the connection's own writer task.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub user: Option<String>,
    outbound: mpsc::UnboundedSender<Envelope>,
}

impl Connection {
    pub fn new(user: Option<String>) -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let user = user.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        (Self { id: ConnectionId::new(), user, outbound }, rx)
    }

    fn deliver(&self, envelope: Envelope) -> bool {
        self.outbound.send(envelope).is_ok()
    }
}

/// The set of live connections, kept in registration order.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    conns: Vec<Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. A non-empty `current_content` is sent to it first so
    /// late joiners converge with existing editors.
    pub fn register(&mut self, conn: Connection, current_content: &str) {
        if !current_content.is_empty() && !conn.deliver(Envelope::ContentSync(current_content.to_string())) {
            warn!("Connection {} closed before catch-up, not registering", conn.id);
            return;
        }
        info!("Registered connection {} (user: {:?}), {} live", conn.id, conn.user, self.conns.len() + 1);
        self.conns.push(conn);
    }

    /// Remove a connection. Unknown ids are ignored.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<Connection> {
        let index = self.conns.iter().position(|c| c.id == id)?;
        let conn = self.conns.remove(index);
        info!("Unregistered connection {}, {} live", id, self.conns.len());
        Some(conn)
    }

    pub fn user_of(&self, id: ConnectionId) -> Option<&str> {
        self.conns.iter().find(|c| c.id == id)?.user.as_deref()
    }

    pub fn bind_user(&mut self, id: ConnectionId, name: &str) {
        if let Some(conn) = self.conns.iter_mut().find(|c| c.id == id) {
            if conn.user.as_deref() != Some(name) {
                debug!("Connection {} is now editing as '{}'", id, name);
                conn.user = Some(name.to_string());
            }
        }
    }

    /// Deliver `envelope` to every connection but `excluding`, in registration
    /// order. Connections that can no longer receive are dropped.
    ///
    /// Returns the number of successful deliveries.
    pub fn broadcast(&mut self, envelope: &Envelope, excluding: Option<ConnectionId>) -> usize {
        let mut delivered = 0;
        let mut failed = Vec::new();

        for conn in &self.conns {
            if Some(conn.id) == excluding {
                continue;
            }
            if conn.deliver(envelope.clone()) {
                delivered += 1;
            } else {
                warn!("Failed to deliver '{}' to connection {}, dropping it", envelope.kind(), conn.id);
                failed.push(conn.id);
            }
        }

        if !failed.is_empty() {
            self.conns.retain(|c| !failed.contains(&c.id));
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }
}
