/**
 * API HTTP + WEBSOCKET - Surface de consultation et de push
 *
 * RÔLE :
 * Expose l'état fusionné aux navigateurs et aux outils.
 *
 * FONCTIONNEMENT :
 * - GET /state : snapshot filtré (navires complets uniquement)
 * - GET /state/{id} : record brut d'un navire, complet ou non ; 404 sinon
 * - GET /ws : session push (snapshot "hello", puis `latest_vessel_data` / `ais_data`)
 * - GET /health, /system/health : supervision
 * - Tout le reste : fichiers statiques du web root
 */

use std::net::SocketAddr;
use std::path::Path;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, Path as UrlPath, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::health::KernelHealth;
use crate::models::{Snapshot, VesselRecord};

#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
}

pub fn build_router(app_state: AppState, web_root: &Path) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/state", get(get_state))
        .route("/state/", get(get_state))
        .route("/state/{id}", get(get_vessel))
        .route("/ws", get(ws_handler))
        .with_state(app_state)
        .fallback_service(ServeDir::new(web_root))
        .layer(TraceLayer::new_for_http())
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.engine.health_report())
}

// GET /state
async fn get_state(State(app): State<AppState>) -> Json<Snapshot> {
    Json(app.engine.snapshot())
}

// GET /state/{id}
async fn get_vessel(
    State(app): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<VesselRecord>, (StatusCode, &'static str)> {
    app.engine
        .vessel(&id)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Vessel not found"))
}

async fn ws_handler(
    State(app): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app.engine, peer))
}

async fn handle_socket(socket: WebSocket, engine: Engine, peer: SocketAddr) {
    let subscription = engine.connect_subscriber();
    let session = subscription.id;
    let mut pushes = subscription.rx;
    info!(%peer, %session, "push session connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(push) = pushes.recv().await {
            if ws_tx.send(Message::Text(push.to_frame().into())).await.is_err() {
                break;
            }
        }
    });

    let registry = engine.subscribers().clone();
    let mut reader = tokio::spawn(async move {
        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(e) = registry.apply_request(session, text.as_str()) {
                        warn!(%session, "ignoring request: {e}");
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(%session, "ws recv error: {e}");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    engine.subscribers().disconnect(session);
    info!(%peer, %session, "push session closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use crate::relay::AggregatorRelay;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router(engine: Engine, web_root: &Path) -> Router {
        build_router(AppState { engine }, web_root)
    }

    fn engine() -> Engine {
        Engine::new(
            EngineOptions::default(),
            AggregatorRelay::disabled(),
            None,
            Snapshot::new(),
        )
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_state_lists_only_complete_vessels() {
        let engine = engine();
        let complete = json!({"UserID": 1, "Latitude": 1.0, "Longitude": 2.0, "CallSign": "A"});
        let partial = json!({"UserID": 2, "Latitude": 3.0});
        engine.store().merge("1", complete.as_object().unwrap());
        engine.store().merge("2", partial.as_object().unwrap());
        let dir = tempfile::tempdir().unwrap();

        for uri in ["/state", "/state/"] {
            let (status, body) = get_json(router(engine.clone(), dir.path()), uri).await;
            assert_eq!(status, StatusCode::OK);
            let state: Value = serde_json::from_slice(&body).unwrap();
            assert!(state.get("1").is_some());
            assert!(state.get("2").is_none());
        }
    }

    #[tokio::test]
    async fn test_single_vessel_bypasses_filter() {
        let engine = engine();
        let partial = json!({"UserID": 2, "Latitude": 3.0});
        engine.store().merge("2", partial.as_object().unwrap());
        let dir = tempfile::tempdir().unwrap();

        let (status, body) = get_json(router(engine.clone(), dir.path()), "/state/2").await;
        assert_eq!(status, StatusCode::OK);
        let vessel: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(vessel["Latitude"], 3.0);
        assert_eq!(vessel["NumMessages"], 1);

        let (status, body) = get_json(router(engine, dir.path()), "/state/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Vessel not found");
    }

    #[tokio::test]
    async fn test_health_and_static_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>ais</h1>").unwrap();

        let (status, body) = get_json(router(engine(), dir.path()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");

        let (status, body) = get_json(router(engine(), dir.path()), "/system/health").await;
        assert_eq!(status, StatusCode::OK);
        let health: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(health["vessels_tracked"], 0);

        let (status, body) = get_json(router(engine(), dir.path()), "/index.html").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<h1>ais</h1>");
    }
}
