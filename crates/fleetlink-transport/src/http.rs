//! Admin HTTP surface.
//!
//! A thin caller of the disconnect coordinator: it owns no state and
//! translates coordinator results into REST responses only.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use fleetlink_core::{
    DeviceId,
    traits::{StatusStore, Transport},
};
use fleetlink_session::{DisconnectCoordinator, DisconnectError, DisconnectOutcome};
use tower_http::cors::CorsLayer;

use crate::protocol::{ErrorBody, SessionInfo};

/// Admin router state.
pub struct AdminState<T, S>
where
    T: Transport,
    S: StatusStore,
{
    coordinator: Arc<DisconnectCoordinator<T, S>>,
}

impl<T, S> Clone for AdminState<T, S>
where
    T: Transport,
    S: StatusStore,
{
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}

/// Create the admin router.
///
/// Routes:
/// - `GET /api/devices/connections` - list live sessions
/// - `GET /api/devices/{device_id}/connection` - session lookup
/// - `DELETE /api/devices/{device_id}/connection` - force disconnect
#[must_use]
pub fn create_admin_router<T, S>(coordinator: Arc<DisconnectCoordinator<T, S>>) -> Router
where
    T: Transport + 'static,
    S: StatusStore + 'static,
{
    Router::new()
        .route(
            "/api/devices/connections",
            get(list_connections::<T, S>),
        )
        .route(
            "/api/devices/{device_id}/connection",
            get(lookup_device::<T, S>).delete(disconnect_device::<T, S>),
        )
        .layer(CorsLayer::permissive())
        .with_state(AdminState { coordinator })
}

async fn list_connections<T, S>(State(state): State<AdminState<T, S>>) -> Json<Vec<SessionInfo>>
where
    T: Transport,
    S: StatusStore,
{
    let sessions = state.coordinator.sessions().await;
    Json(sessions.into_iter().map(SessionInfo::from).collect())
}

async fn lookup_device<T, S>(
    State(state): State<AdminState<T, S>>,
    Path(device_id): Path<DeviceId>,
) -> Response
where
    T: Transport,
    S: StatusStore,
{
    match state.coordinator.lookup(device_id).await {
        Some(session) => (StatusCode::OK, Json(SessionInfo::from(session))).into_response(),
        None => not_connected(device_id),
    }
}

async fn disconnect_device<T, S>(
    State(state): State<AdminState<T, S>>,
    Path(device_id): Path<DeviceId>,
) -> Response
where
    T: Transport,
    S: StatusStore,
{
    match state.coordinator.disconnect(device_id).await {
        Ok(DisconnectOutcome::NotConnected) => not_connected(device_id),
        Ok(DisconnectOutcome::Disconnected { transport_warning }) => {
            let mut response = StatusCode::NO_CONTENT.into_response();
            if let Some(warning) = transport_warning {
                tracing::warn!(device_id, "disconnect completed with transport warning: {warning}");
                if let Ok(value) = HeaderValue::from_str(&warning.to_string()) {
                    response
                        .headers_mut()
                        .insert(HeaderName::from_static("x-transport-warning"), value);
                }
            }
            response
        }
        Err(DisconnectError::Persistence(e)) => {
            tracing::error!(device_id, "disconnect failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn not_connected(device_id: DeviceId) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            message: format!("device {device_id} not found or not connected"),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::Request,
    };
    use fleetlink_core::{DeviceSession, DeviceStatus, StatusEvents};
    use fleetlink_session::{
        CachedDevice, DeviceCache, SessionRegistry, storage::MemoryStatusStore,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::channel::{ChannelTransport, FrameReceiver};

    struct App {
        router: Router,
        store: Arc<MemoryStatusStore>,
        cache: Arc<DeviceCache>,
        _rx: FrameReceiver,
    }

    async fn app_with_device(device_id: DeviceId) -> App {
        let registry = Arc::new(SessionRegistry::new());
        let cache = Arc::new(DeviceCache::new());
        let events = Arc::new(StatusEvents::new());
        let transport = ChannelTransport::new();
        let store = Arc::new(MemoryStatusStore::new());

        let (handle, rx) = transport.open().await;
        let session = DeviceSession::new(device_id, handle);
        cache
            .put(
                device_id,
                session.connection_key,
                CachedDevice::new(DeviceStatus::Online),
            )
            .unwrap();

        let coordinator = Arc::new(DisconnectCoordinator::new(
            registry,
            Arc::clone(&cache),
            events,
            transport,
            Arc::clone(&store),
        ));
        coordinator.register(session).await;

        App {
            router: create_admin_router(coordinator),
            store,
            cache,
            _rx: rx,
        }
    }

    fn delete(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn disconnect_returns_no_content_and_persists_offline() {
        let app = app_with_device(42).await;

        let response = app.router.clone().oneshot(delete("/api/devices/42/connection")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let record = app.store.status(42).await.unwrap().unwrap();
        assert_eq!(record.status, DeviceStatus::Offline);
        assert!(app.cache.is_empty());

        // Second disconnect observes the device as already gone.
        let response = app.router.oneshot(delete("/api/devices/42/connection")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn disconnect_unknown_device_returns_not_found() {
        let app = app_with_device(42).await;

        let response = app.router.oneshot(delete("/api/devices/7/connection")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert!(error.message.contains("not connected"));
    }

    #[tokio::test]
    async fn lookup_returns_session_info() {
        let app = app_with_device(42).await;

        let response = app.router.oneshot(get_req("/api/devices/42/connection")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let info: SessionInfo = serde_json::from_slice(&body).unwrap();
        assert_eq!(info.device_id, 42);
    }

    #[tokio::test]
    async fn list_connections_returns_live_sessions() {
        let app = app_with_device(42).await;

        let response = app.router.oneshot(get_req("/api/devices/connections")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let sessions: Vec<SessionInfo> = serde_json::from_slice(&body).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].device_id, 42);
    }
}
