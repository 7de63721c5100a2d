// HTTP request handlers
use crate::application::interaction::PointerEvent;
use crate::application::overlay_service::OverlayStopped;
use crate::domain::host::BridgeMessage;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

fn stopped(e: OverlayStopped) -> Response {
    tracing::error!("{}", e);
    (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
}

fn accepted(result: Result<(), OverlayStopped>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => stopped(e),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn toggle_monitor(State(state): State<Arc<AppState>>) -> Response {
    match state.overlay.toggle().await {
        Ok(visible) => Json(json!({ "visible": visible })).into_response(),
        Err(e) => stopped(e),
    }
}

pub async fn show_monitor(State(state): State<Arc<AppState>>) -> Response {
    accepted(state.overlay.show().await)
}

pub async fn hide_monitor(State(state): State<Arc<AppState>>) -> Response {
    accepted(state.overlay.hide().await)
}

pub async fn reconnect_monitor(State(state): State<Arc<AppState>>) -> Response {
    accepted(state.overlay.reconnect().await)
}

pub async fn monitor_status(State(state): State<Arc<AppState>>) -> Response {
    match state.overlay.status().await {
        Ok(status) => Json(status).into_response(),
        Err(e) => stopped(e),
    }
}

/// Latest chart snapshot as drawn by the overlay
pub async fn monitor_chart(State(state): State<Arc<AppState>>) -> Response {
    match state.chart.read() {
        Ok(snapshot) => Json(snapshot.clone()).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

pub async fn pointer(State(state): State<Arc<AppState>>, Json(event): Json<PointerEvent>) -> Response {
    match state.overlay.pointer(event).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => stopped(e),
    }
}

pub async fn toggle_series(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    match state.overlay.toggle_series(id).await {
        Ok(Some(visible)) => Json(json!({ "visible": visible })).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => stopped(e),
    }
}

pub async fn recenter(State(state): State<Arc<AppState>>) -> Response {
    match state.workspace.recenter().await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => {
            tracing::error!("Recenter failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn coordinates(State(state): State<Arc<AppState>>) -> Response {
    match state.readout.read() {
        Ok(text) => text.clone().into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Publish a profiler message onto the bridge channel
pub async fn bridge(State(state): State<Arc<AppState>>, Json(message): Json<BridgeMessage>) -> Response {
    match state.bridge.send(message) {
        Ok(_) => StatusCode::ACCEPTED.into_response(),
        Err(_) => {
            tracing::warn!("Bridge message dropped, no listener");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
