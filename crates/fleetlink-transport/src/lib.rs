//! Transport glue for the fleet server.
//!
//! Provides:
//! - Wire/response protocol types
//! - In-process channel transport
//! - Admin HTTP surface (axum)

pub mod channel;
pub mod http;
pub mod protocol;

pub use channel::ChannelTransport;
pub use http::create_admin_router;
pub use protocol::{ChannelFrame, ErrorBody, SessionInfo};
