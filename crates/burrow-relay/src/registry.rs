use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use burrow_types::events::{EventKind, RelayFrame};

/// Process-wide registry of connected relay peers. Lifecycle is tied to the
/// server process; peers are added on connect and removed on disconnect.
/// Nothing is persisted and late joiners see no history.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    /// conn_id -> outbound frame channel
    peers: RwLock<HashMap<Uuid, mpsc::UnboundedSender<RelayFrame>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                peers: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register a peer. Returns its connection id and the receiving end of
    /// its outbound channel.
    pub async fn add(&self) -> (Uuid, mpsc::UnboundedReceiver<RelayFrame>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.peers.write().await.insert(conn_id, tx);
        (conn_id, rx)
    }

    pub async fn remove(&self, conn_id: Uuid) {
        self.inner.peers.write().await.remove(&conn_id);
    }

    /// Re-emit an event to every connected peer except the sender, tagged
    /// with the sender's connection token. A peer whose channel is already
    /// closed is skipped silently; there is no retry and no buffering.
    pub async fn broadcast_except(&self, sender: Uuid, kind: EventKind, body: serde_json::Value) {
        let frame = RelayFrame {
            kind,
            body,
            from: peer_tag(sender),
        };
        let peers = self.inner.peers.read().await;
        for (&conn_id, tx) in peers.iter() {
            if conn_id == sender {
                continue;
            }
            let _ = tx.send(frame.clone());
        }
    }

    pub async fn peer_count(&self) -> usize {
        self.inner.peers.read().await.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Short opaque token identifying a connection on the wire. Derived from the
/// connection id, never from a user id.
pub fn peer_tag(conn_id: Uuid) -> String {
    conn_id.simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn broadcast_reaches_everyone_but_the_sender() {
        let registry = Registry::new();
        let (p1, mut rx1) = registry.add().await;
        let (_p2, mut rx2) = registry.add().await;
        let (_p3, mut rx3) = registry.add().await;

        registry
            .broadcast_except(p1, EventKind::Message, json!({"text": "hi"}))
            .await;

        for rx in [&mut rx2, &mut rx3] {
            let frame = rx.recv().await.unwrap();
            assert_eq!(frame.kind, EventKind::Message);
            assert_eq!(frame.body["text"], "hi");
            assert_eq!(frame.from, peer_tag(p1));
        }

        // the sender receives nothing
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn removed_peer_stops_receiving() {
        let registry = Registry::new();
        let (p1, _rx1) = registry.add().await;
        let (p2, mut rx2) = registry.add().await;

        registry.remove(p2).await;
        assert_eq!(registry.peer_count().await, 1);

        registry
            .broadcast_except(p1, EventKind::Chat, json!({"chat_id": 4}))
            .await;
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_peer_is_dropped_silently() {
        let registry = Registry::new();
        let (p1, _rx1) = registry.add().await;
        let (_p2, rx2) = registry.add().await;
        let (_p3, mut rx3) = registry.add().await;

        // simulate a dead transport without an explicit remove
        drop(rx2);

        registry
            .broadcast_except(p1, EventKind::Friend, json!("refresh"))
            .await;

        // the live peer still gets the frame
        let frame = rx3.recv().await.unwrap();
        assert_eq!(frame.kind, EventKind::Friend);
    }

    #[test]
    fn peer_tag_is_short_and_stable() {
        let id = Uuid::new_v4();
        let tag = peer_tag(id);
        assert_eq!(tag.len(), 8);
        assert_eq!(tag, peer_tag(id));
        assert_ne!(tag, peer_tag(Uuid::new_v4()));
    }
}
