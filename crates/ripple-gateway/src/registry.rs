//! Connection registry — the source of truth for who is online.
//!
//! Entries pair a user ID with the transport (WebSocket connection) it
//! registered from. The registry is owned explicitly and handed to whoever
//! needs it, so tests can build independent instances without cross-talk.

use tokio::sync::RwLock;

/// One registered presence: a user on a specific live transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEntry {
    pub user_id: String,
    pub transport_id: String,
}

/// In-memory set of online users, keyed both ways.
///
/// `add` is insert-if-absent on `user_id`: a second registration for an
/// already-online user is ignored rather than replacing the first. Transport
/// IDs are generated per connection, so no two entries ever share one.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: RwLock<Vec<ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user on a transport. Returns false (and changes nothing)
    /// if the user is already registered.
    pub async fn add(&self, user_id: &str, transport_id: &str) -> bool {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.user_id == user_id) {
            tracing::debug!(user = %user_id, "Duplicate presence registration ignored");
            return false;
        }
        entries.push(ConnectionEntry {
            user_id: user_id.to_string(),
            transport_id: transport_id.to_string(),
        });
        true
    }

    /// Remove the entry registered from a transport, if any.
    pub async fn remove(&self, transport_id: &str) -> Option<ConnectionEntry> {
        let mut entries = self.entries.write().await;
        let pos = entries.iter().position(|e| e.transport_id == transport_id)?;
        Some(entries.swap_remove(pos))
    }

    /// Look up a user's entry — the delivery target for forwarded events.
    pub async fn find(&self, user_id: &str) -> Option<ConnectionEntry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.user_id == user_id)
            .cloned()
    }

    /// Look up which user registered from a transport.
    pub async fn find_by_transport(&self, transport_id: &str) -> Option<ConnectionEntry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.transport_id == transport_id)
            .cloned()
    }

    /// Current full set of entries.
    pub async fn snapshot(&self) -> Vec<ConnectionEntry> {
        self.entries.read().await.clone()
    }

    /// The online user IDs, for presence broadcasts.
    pub async fn online_user_ids(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|e| e.user_id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_then_remove_leaves_empty_snapshot() {
        let registry = ConnectionRegistry::new();
        assert!(registry.add("u1", "t1").await);
        assert!(registry.add("u2", "t2").await);
        registry.remove("t1").await.unwrap();

        let online = registry.online_user_ids().await;
        assert_eq!(online, vec!["u2".to_string()]);
    }

    #[tokio::test]
    async fn repeated_add_for_same_user_is_ignored() {
        let registry = ConnectionRegistry::new();
        assert!(registry.add("u1", "t1").await);
        assert!(!registry.add("u1", "t2").await);

        // The first registration wins; no duplicates appear.
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].transport_id, "t1");
    }

    #[tokio::test]
    async fn remove_unknown_transport_is_a_noop() {
        let registry = ConnectionRegistry::new();
        registry.add("u1", "t1").await;
        assert!(registry.remove("t9").await.is_none());
        assert_eq!(registry.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn find_resolves_delivery_target() {
        let registry = ConnectionRegistry::new();
        registry.add("u1", "t1").await;

        let entry = registry.find("u1").await.unwrap();
        assert_eq!(entry.transport_id, "t1");
        assert!(registry.find("u2").await.is_none());
    }

    #[tokio::test]
    async fn find_by_transport_resolves_sender_identity() {
        let registry = ConnectionRegistry::new();
        registry.add("u1", "t1").await;

        let entry = registry.find_by_transport("t1").await.unwrap();
        assert_eq!(entry.user_id, "u1");
    }

    #[tokio::test]
    async fn interleaved_adds_and_removes_keep_the_set_exact() {
        let registry = ConnectionRegistry::new();
        registry.add("u1", "t1").await;
        registry.add("u2", "t2").await;
        registry.add("u3", "t3").await;
        registry.remove("t2").await;
        registry.add("u2", "t4").await;
        registry.remove("t1").await;

        let mut online = registry.online_user_ids().await;
        online.sort();
        assert_eq!(online, vec!["u2".to_string(), "u3".to_string()]);
    }
}
