//! Device identity and session types.

use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable unique identifier for a tracked device.
///
/// Never reused while a session referencing it is live.
pub type DeviceId = u64;

/// Correlation token linking a session to its cache entry.
///
/// Distinct from both the device identity and the transport handle, so the
/// cache can be addressed without depending on transport internals.
pub type ConnectionKey = Uuid;

/// Opaque reference to a live transport channel.
///
/// The core never inspects the channel; the token is only handed back to the
/// transport layer to request closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionHandle(Uuid);

impl ConnectionHandle {
    /// Mint a fresh handle for a newly accepted channel.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Durable device status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// Device holds a live connection.
    Online,
    /// Device has no live connection.
    Offline,
    /// Status has never been observed.
    Unknown,
}

/// Session lifecycle state.
///
/// Transitions are one-directional and single-use per session instance:
/// `Active` -> `Disconnecting` -> `Closed`. A registry entry is only ever
/// observable as `Active` or `Disconnecting`; `Closed` coincides with its
/// removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Session is registered and serving traffic.
    Active,
    /// Teardown has begun; the session can never return to `Active`.
    Disconnecting,
    /// Terminal state.
    Closed,
}

impl SessionState {
    /// Whether the session may still appear in the registry.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Active | Self::Disconnecting)
    }
}

/// One live connection instance for a device.
///
/// Created by the connection-establishment path once a device is
/// authenticated; destroyed only by the disconnect coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSession {
    /// The owning device. At most one session per device at any instant.
    pub device_id: DeviceId,
    /// Correlation token shared with the cache layer.
    pub connection_key: ConnectionKey,
    /// Opaque transport reference, used only to request closure.
    pub handle: ConnectionHandle,
    /// Current lifecycle state.
    pub state: SessionState,
    /// Unix epoch seconds at which the connection was established.
    pub connected_at: i64,
}

impl DeviceSession {
    /// Create an `Active` session for a freshly accepted channel.
    #[must_use]
    pub fn new(device_id: DeviceId, handle: ConnectionHandle) -> Self {
        Self {
            device_id,
            connection_key: Uuid::new_v4(),
            handle,
            state: SessionState::Active,
            connected_at: now(),
        }
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_active_with_fresh_key() {
        let a = DeviceSession::new(1, ConnectionHandle::new());
        let b = DeviceSession::new(1, ConnectionHandle::new());

        assert_eq!(a.state, SessionState::Active);
        assert!(a.state.is_live());
        assert_ne!(a.connection_key, b.connection_key);
        assert_ne!(a.handle, b.handle);
    }

    #[test]
    fn closed_is_not_live() {
        assert!(SessionState::Disconnecting.is_live());
        assert!(!SessionState::Closed.is_live());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&DeviceStatus::Offline).unwrap();
        assert_eq!(json, "\"offline\"");
    }
}
