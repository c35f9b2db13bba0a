//! Demo fleet admin server.
//!
//! Run with: cargo run -p admin-server
//!
//! Registers a few simulated devices, then serves the admin API on
//! http://localhost:3000. Try:
//!
//! ```text
//! curl http://localhost:3000/api/devices/connections
//! curl http://localhost:3000/api/devices/42/connection
//! curl -X DELETE http://localhost:3000/api/devices/42/connection
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use fleetlink_core::{DeviceId, DeviceSession, DeviceStatus, StatusEvents};
use fleetlink_session::{
    CachedDevice, DeviceCache, DisconnectCoordinator, SessionRegistry,
    storage::MemoryStatusStore,
};
use fleetlink_transport::{ChannelTransport, create_admin_router, protocol::ChannelFrame};
use futures::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let registry = Arc::new(SessionRegistry::new());
    let cache = Arc::new(DeviceCache::new());
    let events = Arc::new(StatusEvents::new());
    let transport = ChannelTransport::new();
    let store = MemoryStatusStore::new();

    let coordinator = Arc::new(DisconnectCoordinator::new(
        Arc::clone(&registry),
        Arc::clone(&cache),
        Arc::clone(&events),
        transport.clone(),
        store,
    ));

    for device_id in [7, 42, 99] {
        connect_simulated_device(&coordinator, &cache, &transport, device_id).await?;
    }

    // Log status events as they happen.
    let mut status_stream = events.history_plus_stream();
    tokio::spawn(async move {
        while let Some(event) = status_stream.next().await {
            tracing::info!(
                device_id = event.device_id,
                status = ?event.status,
                "status event"
            );
        }
    });

    let app = create_admin_router(coordinator);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("Admin API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Open a channel for a fake device and keep draining it until the server
/// closes it.
async fn connect_simulated_device(
    coordinator: &Arc<
        DisconnectCoordinator<ChannelTransport, MemoryStatusStore>,
    >,
    cache: &Arc<DeviceCache>,
    transport: &ChannelTransport,
    device_id: DeviceId,
) -> Result<()> {
    let (handle, mut frames) = transport.open().await;
    let session = DeviceSession::new(device_id, handle);

    cache.put(
        device_id,
        session.connection_key,
        CachedDevice::new(DeviceStatus::Online),
    )?;
    coordinator.register(session).await;

    tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            match serde_json::from_slice::<ChannelFrame>(&frame) {
                Ok(ChannelFrame::Close { graceful }) => {
                    tracing::info!(device_id, graceful, "device channel closed by server");
                    break;
                }
                Err(e) => tracing::warn!(device_id, "unrecognized frame: {e}"),
            }
        }
    });

    Ok(())
}
