//! Wire types for the admin surface and device channels.

use fleetlink_core::{ConnectionKey, DeviceId, DeviceSession, SessionState};
use serde::{Deserialize, Serialize};

/// Session snapshot returned by the admin lookup endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub device_id: DeviceId,
    pub connection_key: ConnectionKey,
    pub state: SessionState,
    pub connected_at: i64,
}

impl From<DeviceSession> for SessionInfo {
    fn from(session: DeviceSession) -> Self {
        Self {
            device_id: session.device_id,
            connection_key: session.connection_key,
            state: session.state,
            connected_at: session.connected_at,
        }
    }
}

/// JSON error body for non-2xx admin responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Frame delivered to a device channel by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelFrame {
    /// Server-initiated closure. `graceful` marks administrative closure as
    /// opposed to an unexpected drop.
    Close { graceful: bool },
}

#[cfg(test)]
mod tests {
    use fleetlink_core::ConnectionHandle;

    use super::*;

    #[test]
    fn close_frame_roundtrip() {
        let frame = ChannelFrame::Close { graceful: true };
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"type":"close","graceful":true}"#);

        let parsed: ChannelFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn session_info_carries_identity_and_state() {
        let session = DeviceSession::new(42, ConnectionHandle::new());
        let key = session.connection_key;

        let info = SessionInfo::from(session);
        let json = serde_json::to_string(&info).unwrap();

        assert_eq!(info.device_id, 42);
        assert_eq!(info.connection_key, key);
        assert!(json.contains("\"state\":\"active\""));
    }
}
