use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::models::Envelope;

/// Fired by a user's idle timer. Only the expiry carrying the user's latest
/// generation ends their presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceExpiry {
    pub name: String,
    pub generation: u64,
}

#[derive(Debug)]
struct PresenceEntry {
    last_activity: DateTime<Utc>,
    generation: u64,
    timer: AbortHandle,
}

/// Derives who is actively editing from edit activity and per-user idle timers.
///
/// Each active user has exactly one pending timer. Activity aborts it and
/// schedules a fresh one; when a timer runs out it posts a [`PresenceExpiry`]
/// to the channel returned by [`PresenceTracker::new`].
#[derive(Debug)]
pub struct PresenceTracker {
    idle: Duration,
    entries: HashMap<String, PresenceEntry>,
    next_generation: u64,
    expiries: mpsc::UnboundedSender<PresenceExpiry>,
}

impl PresenceTracker {
    pub fn new(idle: Duration) -> (Self, mpsc::UnboundedReceiver<PresenceExpiry>) {
        let (expiries, rx) = mpsc::unbounded_channel();
        let tracker = Self {
            idle,
            entries: HashMap::new(),
            next_generation: 0,
            expiries,
        };
        (tracker, rx)
    }

    /// Record an edit by `name`. Returns a presence-join envelope only when
    /// the user was not already active.
    pub fn record_activity(&mut self, name: &str) -> Option<Envelope> {
        self.next_generation += 1;
        let generation = self.next_generation;
        let timer = self.schedule_expiry(name, generation);

        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.timer.abort();
                entry.timer = timer;
                entry.generation = generation;
                entry.last_activity = Utc::now();
                None
            }
            None => {
                info!("'{}' started editing", name);
                self.entries.insert(name.to_string(), PresenceEntry {
                    last_activity: Utc::now(),
                    generation,
                    timer,
                });
                Some(Envelope::PresenceJoin(name.to_string()))
            }
        }
    }

    /// Apply a fired timer. Returns a presence-leave envelope when it ends
    /// the user's presence; stale expiries are ignored.
    pub fn expire(&mut self, expiry: PresenceExpiry) -> Option<Envelope> {
        match self.entries.get(&expiry.name) {
            Some(entry) if entry.generation == expiry.generation => {
                let idle_for = Utc::now() - entry.last_activity;
                info!("'{}' stopped editing (idle {} ms)", expiry.name, idle_for.num_milliseconds());
                self.entries.remove(&expiry.name);
                Some(Envelope::PresenceLeave(expiry.name))
            }
            _ => {
                debug!("Ignoring stale presence expiry for '{}'", expiry.name);
                None
            }
        }
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn active_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    fn schedule_expiry(&self, name: &str, generation: u64) -> AbortHandle {
        let expiries = self.expiries.clone();
        let idle = self.idle;
        let name = name.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(idle).await;
            let _ = expiries.send(PresenceExpiry { name, generation });
        })
        .abort_handle()
    }
}

impl Drop for PresenceTracker {
    fn drop(&mut self) {
        for entry in self.entries.values() {
            entry.timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout};

    const IDLE: Duration = Duration::from_secs(5);

    async fn next_expiry(rx: &mut mpsc::UnboundedReceiver<PresenceExpiry>) -> PresenceExpiry {
        timeout(Duration::from_secs(60), rx.recv())
            .await
            .expect("timer never fired")
            .expect("channel closed")
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_join_once_and_leave_once() {
        let (mut tracker, mut rx) = PresenceTracker::new(IDLE);

        assert_eq!(tracker.record_activity("Ana"), Some(Envelope::PresenceJoin("Ana".to_string())));
        for _ in 0..4 {
            sleep(Duration::from_secs(1)).await;
            assert_eq!(tracker.record_activity("Ana"), None);
        }

        // Nothing fires before a full idle window has passed since the last edit.
        assert!(timeout(Duration::from_millis(4900), rx.recv()).await.is_err());

        let expiry = next_expiry(&mut rx).await;
        assert_eq!(tracker.expire(expiry), Some(Envelope::PresenceLeave("Ana".to_string())));
        assert!(!tracker.is_active("Ana"));

        // Superseded timers were aborted, so nothing else arrives.
        assert!(timeout(Duration::from_secs(30), rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn leave_then_edit_joins_again() {
        let (mut tracker, mut rx) = PresenceTracker::new(IDLE);

        assert!(tracker.record_activity("Ana").is_some());
        let expiry = next_expiry(&mut rx).await;
        assert!(tracker.expire(expiry).is_some());

        assert_eq!(tracker.record_activity("Ana"), Some(Envelope::PresenceJoin("Ana".to_string())));
        assert_eq!(tracker.active_names(), vec!["Ana".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn users_expire_independently() {
        let (mut tracker, mut rx) = PresenceTracker::new(IDLE);

        tracker.record_activity("Ana");
        sleep(Duration::from_secs(3)).await;
        tracker.record_activity("Ben");
        assert_eq!(tracker.active_names(), vec!["Ana".to_string(), "Ben".to_string()]);

        let first = next_expiry(&mut rx).await;
        assert_eq!(tracker.expire(first), Some(Envelope::PresenceLeave("Ana".to_string())));
        assert!(tracker.is_active("Ben"));

        let second = next_expiry(&mut rx).await;
        assert_eq!(tracker.expire(second), Some(Envelope::PresenceLeave("Ben".to_string())));
        assert!(tracker.active_names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_expiry_is_ignored() {
        let (mut tracker, _rx) = PresenceTracker::new(IDLE);
        tracker.record_activity("Ana");
        tracker.record_activity("Ana");

        let stale = PresenceExpiry { name: "Ana".to_string(), generation: 1 };
        assert_eq!(tracker.expire(stale), None);
        assert!(tracker.is_active("Ana"));

        let unknown = PresenceExpiry { name: "Ben".to_string(), generation: 2 };
        assert_eq!(tracker.expire(unknown), None);
    }

    #[tokio::test(start_paused = true)]
    async fn never_editing_means_never_present() {
        let (tracker, mut rx) = PresenceTracker::new(IDLE);
        assert!(tracker.active_names().is_empty());
        assert!(timeout(Duration::from_secs(30), rx.recv()).await.is_err());
    }
}
