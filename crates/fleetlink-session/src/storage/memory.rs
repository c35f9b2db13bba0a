//! In-memory device status store.

use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;
use fleetlink_core::{
    DeviceId, DeviceStatus,
    traits::{StatusRecord, StatusStore, StorageError},
};

/// In-memory status store.
///
/// Useful for development and single-process deployments.
/// Data is lost on restart.
pub struct MemoryStatusStore {
    records: RwLock<HashMap<DeviceId, StatusRecord>>,
}

impl MemoryStatusStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn set_status(
        &self,
        device_id: DeviceId,
        status: DeviceStatus,
        at: Option<i64>,
    ) -> Result<(), StorageError> {
        self.records
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .insert(device_id, StatusRecord { status, updated_at: at });
        Ok(())
    }

    async fn status(&self, device_id: DeviceId) -> Result<Option<StatusRecord>, StorageError> {
        Ok(self
            .records
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .get(&device_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_device_has_no_record() {
        let store = MemoryStatusStore::new();
        assert!(store.status(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_status_overwrites_prior_record() {
        let store = MemoryStatusStore::new();

        store
            .set_status(42, DeviceStatus::Online, Some(1_700_000_000))
            .await
            .unwrap();
        store.set_status(42, DeviceStatus::Offline, None).await.unwrap();

        let record = store.status(42).await.unwrap().unwrap();
        assert_eq!(record.status, DeviceStatus::Offline);
        assert_eq!(record.updated_at, None);
    }
}
