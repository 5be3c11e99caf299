//! Live-reload session registry.
//!
//! Each WebSocket connection registers a session: a buffered sender for
//! outgoing frames plus the URL the browser declared in its handshake.
//! Fan-out never blocks the watch loop; a session whose buffer is full or
//! whose receiver is gone is dropped on the next delivery attempt.

use arbor_core::ReloadMessage;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Outgoing frames buffered per session before the socket writer drains them.
const SESSION_BUFFER: usize = 32;

#[derive(Debug)]
struct Session {
    sender: mpsc::Sender<ReloadMessage>,
    /// Set by the handshake; sessions without one receive only broadcasts.
    current_url: Option<String>,
}

/// Registry of connected live-reload sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<FxHashMap<usize, Session>>,
    next_id: AtomicUsize,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session; the receiver feeds the socket writer task.
    pub fn register(&self) -> (usize, mpsc::Receiver<ReloadMessage>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        self.sessions.write().insert(
            id,
            Session {
                sender: tx,
                current_url: None,
            },
        );
        (id, rx)
    }

    pub fn unregister(&self, id: usize) {
        self.sessions.write().remove(&id);
    }

    /// Record the URL a session declared in its handshake.
    pub fn set_url(&self, id: usize, url: String) {
        if let Some(session) = self.sessions.write().get_mut(&id) {
            session.current_url = Some(url);
        }
    }

    /// Deliver a frame to one session. Dead sessions are dropped.
    pub fn send_to(&self, id: usize, message: ReloadMessage) {
        let dead = {
            let sessions = self.sessions.read();
            match sessions.get(&id) {
                Some(session) => session.sender.try_send(message).is_err(),
                None => false,
            }
        };
        if dead {
            self.unregister(id);
        }
    }

    /// Deliver a frame to every session. Dead sessions are dropped.
    pub fn broadcast(&self, message: &ReloadMessage) {
        let mut dead = Vec::new();
        {
            let sessions = self.sessions.read();
            for (id, session) in sessions.iter() {
                if session.sender.try_send(message.clone()).is_err() {
                    dead.push(*id);
                }
            }
        }
        for id in dead {
            self.unregister(id);
        }
    }

    /// Snapshot of sessions that have completed their handshake.
    pub fn handshaken(&self) -> Vec<(usize, String)> {
        self.sessions
            .read()
            .iter()
            .filter_map(|(id, s)| s.current_url.clone().map(|url| (*id, url)))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_sessions_receive_broadcasts() {
        let registry = SessionRegistry::new();
        let (_id1, mut rx1) = registry.register();
        let (_id2, mut rx2) = registry.register();
        assert_eq!(registry.count(), 2);

        registry.broadcast(&ReloadMessage::Unlink);
        assert_eq!(rx1.recv().await, Some(ReloadMessage::Unlink));
        assert_eq!(rx2.recv().await, Some(ReloadMessage::Unlink));
    }

    #[tokio::test]
    async fn handshake_urls_are_tracked_per_session() {
        let registry = SessionRegistry::new();
        let (id1, _rx1) = registry.register();
        let (_id2, _rx2) = registry.register();

        registry.set_url(id1, "/blog/first-post".to_string());

        let handshaken = registry.handshaken();
        assert_eq!(handshaken, vec![(id1, "/blog/first-post".to_string())]);
    }

    #[tokio::test]
    async fn dropped_receivers_are_pruned_on_delivery() {
        let registry = SessionRegistry::new();
        let (id, rx) = registry.register();
        drop(rx);

        registry.send_to(id, ReloadMessage::Unlink);
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let registry = SessionRegistry::new();
        let (id, _rx) = registry.register();
        registry.unregister(id);
        registry.unregister(id);
        assert_eq!(registry.count(), 0);
    }
}
