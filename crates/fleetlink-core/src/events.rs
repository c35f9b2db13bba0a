//! Broadcast + history store for device status events.

use std::{collections::VecDeque, sync::RwLock};

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::device::{DeviceId, DeviceStatus};

/// Number of events retained for replay.
const HISTORY_EVENTS: usize = 4096;

/// One observed device status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// The device whose status changed.
    pub device_id: DeviceId,
    /// The status it changed to.
    pub status: DeviceStatus,
    /// Unix epoch seconds, when the change carried a timestamp.
    pub at: Option<i64>,
}

/// Status event store with broadcast and history support.
///
/// Late subscribers receive retained history first, then seamlessly switch
/// to live updates.
pub struct StatusEvents {
    history: RwLock<VecDeque<StatusEvent>>,
    sender: broadcast::Sender<StatusEvent>,
}

impl Default for StatusEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusEvents {
    /// Create a new event store.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1024);
        Self {
            history: RwLock::new(VecDeque::with_capacity(32)),
            sender,
        }
    }

    /// Push an event to both live listeners and history.
    pub fn publish(&self, event: StatusEvent) {
        let _ = self.sender.send(event.clone()); // live listeners

        let mut history = self.history.write().unwrap();
        while history.len() >= HISTORY_EVENTS {
            history.pop_front();
        }
        history.push_back(event);
    }

    /// Get a receiver for live updates.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.sender.subscribe()
    }

    /// Snapshot of the retained history.
    #[must_use]
    pub fn history(&self) -> Vec<StatusEvent> {
        self.history.read().unwrap().iter().cloned().collect()
    }

    /// Stream that yields history first, then live updates.
    #[must_use]
    pub fn history_plus_stream(&self) -> futures::stream::BoxStream<'static, StatusEvent> {
        let (history, rx) = (self.history(), self.subscribe());

        let hist = futures::stream::iter(history);
        let live = BroadcastStream::new(rx).filter_map(|res| async move { res.ok() });

        Box::pin(hist.chain(live))
    }
}
