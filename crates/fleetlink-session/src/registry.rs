//! Concurrent registry of live device sessions.

use std::collections::HashMap;

use fleetlink_core::{ConnectionKey, DeviceId, DeviceSession};
use tokio::sync::RwLock;

/// Concurrent map from device identity to its live session.
///
/// The registry is the sole authority on session existence. It performs no
/// I/O and no cache interaction; teardown side effects belong to the
/// disconnect coordinator, which is the only caller permitted to remove
/// entries.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<DeviceId, DeviceSession>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Record a newly established session.
    ///
    /// A prior entry for the same device is superseded and returned; the old
    /// connection is presumed already torn down by the caller or left to be
    /// reconciled by a later disconnect.
    pub async fn insert(&self, session: DeviceSession) -> Option<DeviceSession> {
        self.sessions
            .write()
            .await
            .insert(session.device_id, session)
    }

    /// Snapshot of the current session for a device, if any.
    pub async fn lookup(&self, device_id: DeviceId) -> Option<DeviceSession> {
        self.sessions.read().await.get(&device_id).cloned()
    }

    /// Atomically remove and return the session for a device.
    ///
    /// Absent means "nothing to do," never an error.
    pub async fn remove(&self, device_id: DeviceId) -> Option<DeviceSession> {
        self.sessions.write().await.remove(&device_id)
    }

    /// Remove the session for a device only if its connection key matches.
    ///
    /// Used by the transport-failure path so a delayed teardown of a
    /// superseded connection cannot evict the device's newer session.
    pub async fn remove_matching(
        &self,
        device_id: DeviceId,
        connection_key: ConnectionKey,
    ) -> Option<DeviceSession> {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(&device_id)
            .is_some_and(|s| s.connection_key == connection_key)
        {
            sessions.remove(&device_id)
        } else {
            None
        }
    }

    /// Snapshot of all live sessions.
    pub async fn active_sessions(&self) -> Vec<DeviceSession> {
        self.sessions.read().await.values().cloned().collect()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no device is connected.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetlink_core::ConnectionHandle;

    #[tokio::test]
    async fn insert_then_lookup_returns_session() {
        let registry = SessionRegistry::new();
        let session = DeviceSession::new(42, ConnectionHandle::new());
        let key = session.connection_key;

        assert!(registry.insert(session).await.is_none());

        let found = registry.lookup(42).await.unwrap();
        assert_eq!(found.device_id, 42);
        assert_eq!(found.connection_key, key);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = SessionRegistry::new();
        registry
            .insert(DeviceSession::new(42, ConnectionHandle::new()))
            .await;

        assert!(registry.remove(42).await.is_some());
        assert!(registry.remove(42).await.is_none());
        assert!(registry.lookup(42).await.is_none());
    }

    #[tokio::test]
    async fn insert_supersedes_prior_session() {
        let registry = SessionRegistry::new();
        let old = DeviceSession::new(42, ConnectionHandle::new());
        let old_key = old.connection_key;
        registry.insert(old).await;

        let new = DeviceSession::new(42, ConnectionHandle::new());
        let new_key = new.connection_key;
        let superseded = registry.insert(new).await.unwrap();

        assert_eq!(superseded.connection_key, old_key);
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.lookup(42).await.unwrap().connection_key, new_key);
    }

    #[tokio::test]
    async fn remove_matching_ignores_superseded_key() {
        let registry = SessionRegistry::new();
        let old = DeviceSession::new(42, ConnectionHandle::new());
        let old_key = old.connection_key;
        registry.insert(old).await;

        let new = DeviceSession::new(42, ConnectionHandle::new());
        let new_key = new.connection_key;
        registry.insert(new).await;

        // Late teardown of the superseded connection must not evict the
        // newer session.
        assert!(registry.remove_matching(42, old_key).await.is_none());
        assert!(registry.lookup(42).await.is_some());

        assert!(registry.remove_matching(42, new_key).await.is_some());
        assert!(registry.is_empty().await);
    }
}
