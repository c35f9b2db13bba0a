//! Session registry, cache coherency, and disconnect orchestration.
//!
//! Provides:
//! - `SessionRegistry` - Concurrent map of live device sessions
//! - `DeviceCache` - Denormalized read cache keyed by session
//! - `DisconnectCoordinator` - Ordered teardown across collaborators
//! - Status store implementations (memory)

pub mod cache;
pub mod coordinator;
pub mod registry;
pub mod storage;

pub use cache::{CacheError, CachedDevice, DeviceCache};
pub use coordinator::{DisconnectCoordinator, DisconnectError, DisconnectOutcome};
pub use registry::SessionRegistry;
