use axum::{
    extract::{State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info};

use crate::config::{DisplaySettings, FilterSettings};
use super::{AppState, DashboardEvent};

// === Dashboard Data Endpoints ===

pub async fn get_snapshot(
    State(state): State<AppState>,
) -> impl IntoResponse {
    Json(state.dashboard.get_data().await)
}

// === Config Endpoints ===

pub async fn get_config(
    State(state): State<AppState>,
) -> impl IntoResponse {
    Json(state.config_manager.get_config().await)
}

pub async fn put_filter_settings(
    State(state): State<AppState>,
    Json(settings): Json<FilterSettings>,
) -> impl IntoResponse {
    match state.config_manager.update_filter(settings).await {
        Ok(()) => {
            (StatusCode::OK, Json(json!({"status": "ok", "message": "Filter settings updated"}))).into_response()
        }
        Err(e) => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": e}))).into_response()
        }
    }
}

pub async fn put_display_settings(
    State(state): State<AppState>,
    Json(settings): Json<DisplaySettings>,
) -> impl IntoResponse {
    let title = settings.title.clone();
    match state.config_manager.update_display(settings).await {
        Ok(()) => {
            state.dashboard.set_title(title).await;
            (StatusCode::OK, Json(json!({"status": "ok", "message": "Display settings updated"}))).into_response()
        }
        Err(e) => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": e}))).into_response()
        }
    }
}

// === WebSocket ===

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_websocket(socket, state))
}

/// Next dashboard event for a socket. A slow client skips what it missed
/// instead of being dropped; `None` once the dashboard is gone.
async fn next_event(rx: &mut broadcast::Receiver<DashboardEvent>) -> Option<DashboardEvent> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                debug!("WebSocket client lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

async fn handle_websocket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.dashboard.tx.subscribe();

    info!("WebSocket client connected");

    // Current view first, then every refresh as it is published
    let initial = DashboardEvent::Refresh(state.dashboard.get_data().await);
    if let Ok(json_str) = serde_json::to_string(&initial) {
        let _ = sender.send(Message::Text(json_str)).await;
    }

    let send_task = tokio::spawn(async move {
        while let Some(event) = next_event(&mut rx).await {
            if let Ok(json) = serde_json::to_string(&event) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Ping(_)) => {
                debug!("Received ping");
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket client disconnected");
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
}

// === Health ===

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    view: &'static str,
}

pub async fn health_check(
    State(state): State<AppState>,
) -> impl IntoResponse {
    let data = state.dashboard.get_data().await;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        view: data.view.label(),
    })
}
