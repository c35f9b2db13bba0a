//! Core abstractions for fleet device connection tracking.
//!
//! This crate provides the fundamental building blocks:
//! - `DeviceSession` - One live connection instance for a device
//! - `StatusEvents` - Broadcast + history for device status updates
//! - Transport and status-store collaborator traits

pub mod device;
pub mod events;
pub mod traits;

pub use device::{
    ConnectionHandle, ConnectionKey, DeviceId, DeviceSession, DeviceStatus, SessionState,
};
pub use events::{StatusEvent, StatusEvents};
pub use traits::{StatusStore, Transport};
