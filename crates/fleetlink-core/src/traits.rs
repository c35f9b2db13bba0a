//! Collaborator traits for transport closure and status persistence.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::{ConnectionHandle, DeviceId, DeviceStatus};

/// Persisted status record for a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Durable status.
    pub status: DeviceStatus,
    /// Unix epoch seconds of the update, when one was supplied.
    pub updated_at: Option<i64>,
}

/// Storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Device not found: {0}")]
    NotFound(DeviceId),
    #[error("Storage error: {0}")]
    Internal(String),
}

/// Trait for durable device-status stores.
///
/// The storage engine itself lives outside this core; this is the contract
/// the disconnect path requires from it.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Record a device's durable status.
    ///
    /// `at` carries the moment the status was observed; `None` means the
    /// caller has no meaningful timestamp (a forced disconnect, for one).
    async fn set_status(
        &self,
        device_id: DeviceId,
        status: DeviceStatus,
        at: Option<i64>,
    ) -> Result<(), StorageError>;

    /// Read back a device's durable status.
    async fn status(&self, device_id: DeviceId) -> Result<Option<StatusRecord>, StorageError>;
}

#[async_trait]
impl<S: StatusStore + ?Sized> StatusStore for Arc<S> {
    async fn set_status(
        &self,
        device_id: DeviceId,
        status: DeviceStatus,
        at: Option<i64>,
    ) -> Result<(), StorageError> {
        (**self).set_status(device_id, status, at).await
    }

    async fn status(&self, device_id: DeviceId) -> Result<Option<StatusRecord>, StorageError> {
        (**self).status(device_id).await
    }
}

/// Transport error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Unknown connection handle: {0}")]
    UnknownHandle(ConnectionHandle),
    #[error("Channel already closed: {0}")]
    ChannelClosed(ConnectionHandle),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for the transport layer owning live device channels.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Request closure of a live channel.
    ///
    /// Fire-and-forget from the caller's perspective; an error is only
    /// observed when the transport surfaces one synchronously. `graceful`
    /// distinguishes administrative closure from an unexpected drop, since
    /// downstream reconnection backoff may treat the two differently.
    ///
    /// # Errors
    /// Returns an error if the transport cannot confirm closure.
    async fn close(&self, handle: ConnectionHandle, graceful: bool) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn close(&self, handle: ConnectionHandle, graceful: bool) -> Result<(), TransportError> {
        (**self).close(handle, graceful).await
    }
}
