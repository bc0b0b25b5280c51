//! Open WebSocket connections and their subscriptions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

pub struct Connection {
    pub connection_id: String,
    /// Owner of the token the client connected with, if it sent one.
    pub principal_id: Option<String>,
    /// Chat or channel IDs; empty means "everything".
    pub subscriptions: Vec<String>,
    pub connected_at: DateTime<Utc>,
}

/// Tracks all active gateway connections.
pub struct ConnectionManager {
    connections: Arc<RwLock<HashMap<String, Connection>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, connection_id: String, principal_id: Option<String>) {
        let conn = Connection {
            connection_id: connection_id.clone(),
            principal_id,
            subscriptions: Vec::new(),
            connected_at: Utc::now(),
        };
        self.connections.write().await.insert(connection_id, conn);
    }

    /// Replace the subscription list of a connection.
    pub async fn subscribe(&self, connection_id: &str, subscriptions: Vec<String>) {
        if let Some(conn) = self.connections.write().await.get_mut(connection_id) {
            conn.subscriptions = subscriptions;
        }
    }

    pub async fn subscriptions(&self, connection_id: &str) -> Vec<String> {
        self.connections
            .read()
            .await
            .get(connection_id)
            .map(|c| c.subscriptions.clone())
            .unwrap_or_default()
    }

    pub async fn remove(&self, connection_id: &str) {
        self.connections.write().await.remove(connection_id);
    }

    pub async fn active_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_subscribe_remove() {
        let manager = ConnectionManager::new();
        manager.register("c1".into(), None).await;
        manager.register("c2".into(), Some("user_abc".into())).await;
        assert_eq!(manager.active_count().await, 2);
        assert!(manager.subscriptions("c1").await.is_empty());

        manager.subscribe("c1", vec!["chat_1".into()]).await;
        assert_eq!(manager.subscriptions("c1").await, vec!["chat_1".to_string()]);

        manager.remove("c1").await;
        assert_eq!(manager.active_count().await, 1);
        assert!(manager.subscriptions("c1").await.is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_unknown_connection_is_noop() {
        let manager = ConnectionManager::new();
        manager.subscribe("missing", vec!["chat_1".into()]).await;
        assert_eq!(manager.active_count().await, 0);
    }
}
