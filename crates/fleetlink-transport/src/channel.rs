//! In-process channel transport.
//!
//! Owns the server side of live device channels. Real deployments put a
//! TCP/UDP listener in front; the core only ever addresses channels through
//! `ConnectionHandle` tokens, so the registry and coordinator stay agnostic
//! to what sits behind them.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use fleetlink_core::{
    ConnectionHandle,
    traits::{Transport, TransportError},
};
use tokio::sync::{RwLock, mpsc};

use crate::protocol::ChannelFrame;

/// Receiving half handed to the connection task for a live channel.
pub type FrameReceiver = mpsc::UnboundedReceiver<Bytes>;

/// In-process transport implementation.
#[derive(Clone, Default)]
pub struct ChannelTransport {
    channels: Arc<RwLock<HashMap<ConnectionHandle, mpsc::UnboundedSender<Bytes>>>>,
}

impl ChannelTransport {
    /// Create a transport with no live channels.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Attach a live channel and hand back its handle and receiving half.
    pub async fn open(&self) -> (ConnectionHandle, FrameReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle::new();
        self.channels.write().await.insert(handle, tx);
        (handle, rx)
    }

    /// Number of live channels.
    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Whether no channel is live.
    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn close(&self, handle: ConnectionHandle, graceful: bool) -> Result<(), TransportError> {
        let sender = self
            .channels
            .write()
            .await
            .remove(&handle)
            .ok_or(TransportError::UnknownHandle(handle))?;

        match serde_json::to_vec(&ChannelFrame::Close { graceful }) {
            Ok(payload) => {
                if sender.send(Bytes::from(payload)).is_err() {
                    return Err(TransportError::ChannelClosed(handle));
                }
            }
            Err(e) => tracing::error!(%handle, "failed to serialize close frame: {e}"),
        }

        // Dropping the sender ends the device's frame stream.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn close_delivers_graceful_frame_and_unregisters() {
        let transport = ChannelTransport::new();
        let (handle, mut rx) = transport.open().await;
        assert_eq!(transport.len().await, 1);

        transport.close(handle, true).await.unwrap();

        let payload = rx.recv().await.unwrap();
        let frame: ChannelFrame = serde_json::from_slice(&payload).unwrap();
        assert_eq!(frame, ChannelFrame::Close { graceful: true });

        // Stream ends after the close frame.
        assert!(rx.recv().await.is_none());
        assert!(transport.is_empty().await);
    }

    #[tokio::test]
    async fn close_unknown_handle_fails() {
        let transport = ChannelTransport::new();
        let result = transport.close(ConnectionHandle::new(), true).await;
        assert!(matches!(result, Err(TransportError::UnknownHandle(_))));
    }

    #[tokio::test]
    async fn close_is_single_use_per_handle() {
        let transport = ChannelTransport::new();
        let (handle, _rx) = transport.open().await;

        transport.close(handle, false).await.unwrap();
        let second = transport.close(handle, false).await;
        assert!(matches!(second, Err(TransportError::UnknownHandle(_))));
    }

    #[tokio::test]
    async fn close_with_dropped_receiver_reports_channel_closed() {
        let transport = ChannelTransport::new();
        let (handle, rx) = transport.open().await;
        drop(rx);

        let result = transport.close(handle, true).await;
        assert!(matches!(result, Err(TransportError::ChannelClosed(_))));
    }
}
