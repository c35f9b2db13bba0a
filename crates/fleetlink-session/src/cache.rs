//! Cache coherency layer: denormalized device state keyed by session.

use std::{collections::HashMap, sync::RwLock};

use fleetlink_core::{ConnectionKey, DeviceId, DeviceStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Cache error.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache error: {0}")]
    Internal(String),
}

/// Denormalized device state held for fast read paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedDevice {
    /// Last known durable status.
    pub status: DeviceStatus,
    /// Unix epoch seconds of the last status update, if known.
    pub updated_at: Option<i64>,
    /// Arbitrary denormalized attributes for app-specific read paths.
    pub attributes: HashMap<String, Value>,
}

impl CachedDevice {
    /// Create an entry with no timestamp and no attributes.
    #[must_use]
    pub fn new(status: DeviceStatus) -> Self {
        Self {
            status,
            updated_at: None,
            attributes: HashMap::new(),
        }
    }
}

/// Secondary store keyed by `(DeviceId, ConnectionKey)`.
///
/// Entries mirror registry sessions and never outlive them. The compound key
/// is the addressing unit: a delayed invalidation of a superseded session
/// cannot wipe a newer session's entry, and a stale entry is never removed
/// by a disconnect it does not belong to. The cache holds no authority over
/// session existence.
pub struct DeviceCache {
    entries: RwLock<HashMap<(DeviceId, ConnectionKey), CachedDevice>>,
}

impl Default for DeviceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Populate the entry for a live session.
    ///
    /// # Errors
    /// Returns `CacheError` if the cache lock is poisoned.
    pub fn put(
        &self,
        device_id: DeviceId,
        connection_key: ConnectionKey,
        entry: CachedDevice,
    ) -> Result<(), CacheError> {
        self.entries
            .write()
            .map_err(|e| CacheError::Internal(e.to_string()))?
            .insert((device_id, connection_key), entry);
        Ok(())
    }

    /// Read the entry for a session, if cached.
    ///
    /// # Errors
    /// Returns `CacheError` if the cache lock is poisoned.
    pub fn get(
        &self,
        device_id: DeviceId,
        connection_key: ConnectionKey,
    ) -> Result<Option<CachedDevice>, CacheError> {
        Ok(self
            .entries
            .read()
            .map_err(|e| CacheError::Internal(e.to_string()))?
            .get(&(device_id, connection_key))
            .cloned())
    }

    /// Remove the entry for exactly this session.
    ///
    /// A mismatched key is untouched. Returns whether an entry was removed.
    ///
    /// # Errors
    /// Returns `CacheError` if the cache lock is poisoned.
    pub fn invalidate(
        &self,
        device_id: DeviceId,
        connection_key: ConnectionKey,
    ) -> Result<bool, CacheError> {
        Ok(self
            .entries
            .write()
            .map_err(|e| CacheError::Internal(e.to_string()))?
            .remove(&(device_id, connection_key))
            .is_some())
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
