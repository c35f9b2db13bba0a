//! Disconnect coordinator: ordered session teardown.

use std::sync::Arc;

use fleetlink_core::{
    ConnectionKey, DeviceId, DeviceSession, DeviceStatus, SessionState, StatusEvent, StatusEvents,
    traits::{StatusStore, StorageError, Transport, TransportError},
};

use crate::{cache::DeviceCache, registry::SessionRegistry};

/// Disconnect error.
#[derive(Debug, thiserror::Error)]
pub enum DisconnectError {
    #[error("Status persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

/// Outcome of a disconnect request.
#[derive(Debug)]
pub enum DisconnectOutcome {
    /// No session existed for the device; nothing to do.
    NotConnected,
    /// The teardown sequence ran to completion.
    Disconnected {
        /// Transport-close failure observed during an otherwise successful
        /// teardown.
        transport_warning: Option<TransportError>,
    },
}

/// Orchestrates session teardown in a fixed order: registry removal,
/// transport closure, durable status update, cache invalidation.
///
/// Both transport-failure callbacks and administrative requests enter
/// through this type. It is the only writer permitted to remove registry
/// and cache entries for a device, and it never holds a registry lock
/// across a collaborator call.
pub struct DisconnectCoordinator<T, S>
where
    T: Transport,
    S: StatusStore,
{
    registry: Arc<SessionRegistry>,
    cache: Arc<DeviceCache>,
    events: Arc<StatusEvents>,
    transport: T,
    status_store: S,
}

impl<T, S> DisconnectCoordinator<T, S>
where
    T: Transport,
    S: StatusStore,
{
    /// Create a new coordinator over the given stores and collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<SessionRegistry>,
        cache: Arc<DeviceCache>,
        events: Arc<StatusEvents>,
        transport: T,
        status_store: S,
    ) -> Self {
        Self {
            registry,
            cache,
            events,
            transport,
            status_store,
        }
    }

    /// Record a newly established session and publish its `Online` event.
    pub async fn register(&self, session: DeviceSession) {
        let device_id = session.device_id;
        let connected_at = session.connected_at;

        if let Some(old) = self.registry.insert(session).await {
            tracing::info!(
                device_id,
                old_key = %old.connection_key,
                "new connection superseded a live session"
            );
        }

        self.events.publish(StatusEvent {
            device_id,
            status: DeviceStatus::Online,
            at: Some(connected_at),
        });
    }

    /// Snapshot of the current session for a device.
    pub async fn lookup(&self, device_id: DeviceId) -> Option<DeviceSession> {
        self.registry.lookup(device_id).await
    }

    /// Snapshot of all live sessions.
    pub async fn sessions(&self) -> Vec<DeviceSession> {
        self.registry.active_sessions().await
    }

    /// Force-terminate a device's connection.
    ///
    /// Concurrent calls for the same device are linearized by the registry:
    /// exactly one performs the teardown, the rest observe `NotConnected`.
    ///
    /// # Errors
    /// Returns `DisconnectError::Persistence` if the durable status update
    /// fails. The registry removal is final either way; it is never
    /// compensated.
    pub async fn disconnect(
        &self,
        device_id: DeviceId,
    ) -> Result<DisconnectOutcome, DisconnectError> {
        match self.registry.remove(device_id).await {
            Some(session) => self.tear_down(session, true).await,
            None => Ok(DisconnectOutcome::NotConnected),
        }
    }

    /// Transport-failure entry point.
    ///
    /// Removal is keyed by `(device, connection_key)`: a callback for a
    /// connection that has since been superseded is a no-op. `graceful`
    /// is forwarded to the transport so downstream logic can tell an
    /// administrative closure from an unexpected drop.
    ///
    /// # Errors
    /// Returns `DisconnectError::Persistence` if the durable status update
    /// fails.
    pub async fn connection_lost(
        &self,
        device_id: DeviceId,
        connection_key: ConnectionKey,
        graceful: bool,
    ) -> Result<DisconnectOutcome, DisconnectError> {
        match self
            .registry
            .remove_matching(device_id, connection_key)
            .await
        {
            Some(session) => self.tear_down(session, graceful).await,
            None => Ok(DisconnectOutcome::NotConnected),
        }
    }

    async fn tear_down(
        &self,
        mut session: DeviceSession,
        graceful: bool,
    ) -> Result<DisconnectOutcome, DisconnectError> {
        session.state = SessionState::Disconnecting;
        let device_id = session.device_id;

        let transport_warning = match self.transport.close(session.handle, graceful).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(device_id, handle = %session.handle, "transport close failed: {e}");
                Some(e)
            }
        };

        // A dead transport must still end up offline in storage.
        self.status_store
            .set_status(device_id, DeviceStatus::Offline, None)
            .await?;

        // Last step: the registry no longer resolves the device, so no
        // reader can observe a cache entry without a registry counterpart.
        match self.cache.invalidate(device_id, session.connection_key) {
            Ok(removed) => {
                if !removed {
                    tracing::debug!(device_id, key = %session.connection_key, "no cache entry to invalidate");
                }
            }
            Err(e) => {
                tracing::warn!(device_id, "cache invalidation failed: {e}");
            }
        }

        self.events.publish(StatusEvent {
            device_id,
            status: DeviceStatus::Offline,
            at: None,
        });
        session.state = SessionState::Closed;

        Ok(DisconnectOutcome::Disconnected { transport_warning })
    }
}
