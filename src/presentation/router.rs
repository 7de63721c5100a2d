// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    bridge, coordinates, health_check, hide_monitor, monitor_chart, monitor_status, pointer,
    reconnect_monitor, recenter, show_monitor, toggle_monitor, toggle_series,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/monitor/toggle", post(toggle_monitor))
        .route("/monitor/show", post(show_monitor))
        .route("/monitor/hide", post(hide_monitor))
        .route("/monitor/reconnect", post(reconnect_monitor))
        .route("/monitor/status", get(monitor_status))
        .route("/monitor/chart", get(monitor_chart))
        .route("/monitor/pointer", post(pointer))
        .route("/monitor/series/:id/toggle", post(toggle_series))
        .route("/layout/recenter", post(recenter))
        .route("/canvas/coordinates", get(coordinates))
        .route("/bridge", post(bridge))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::chart_renderer::testing::RecordingRenderer;
    use crate::application::overlay_controller::{OverlayController, OverlaySettings};
    use crate::application::overlay_service::OverlayService;
    use crate::application::telemetry_client::testing::FakeTransport;
    use crate::application::view_state_store::testing::MemoryStorage;
    use crate::application::view_state_store::ViewStateStore;
    use crate::domain::graph::{Graph, GraphNode, Viewport};
    use crate::domain::host::BridgeMessage;
    use crate::domain::telemetry::ModeProfiles;
    use crate::infrastructure::workspace::{SharedWorkspace, Workspace};
    use serde_json::{json, Value};
    use std::sync::RwLock;
    use tokio::sync::broadcast;
    use url::Url;

    struct TestApp {
        base: String,
        client: reqwest::Client,
        transport: FakeTransport,
        bridge_rx: broadcast::Receiver<BridgeMessage>,
    }

    async fn spawn_app() -> TestApp {
        let transport = FakeTransport::default();
        let (controller, link_rx) = OverlayController::new(
            OverlaySettings {
                endpoint: Url::parse("ws://localhost/telemetry/ws").unwrap(),
                profiles: ModeProfiles::default(),
            },
            Arc::new(transport.clone()),
            RecordingRenderer::default().factory(),
            ViewStateStore::new(Arc::new(MemoryStorage::default())),
        );
        let (service, overlay) = OverlayService::new(controller, link_rx);
        tokio::spawn(service.run());

        let graph = Graph {
            nodes: vec![GraphNode::new(1, [0.0, 0.0], Some([100.0, 100.0]))],
            ..Default::default()
        };
        let (bridge, bridge_rx) = broadcast::channel(8);
        let state = Arc::new(AppState {
            overlay,
            chart: Default::default(),
            workspace: SharedWorkspace::new(Workspace::new(Some(graph), Viewport::default())),
            readout: Arc::new(RwLock::new("x: 0, y: 0 | zoom: 1.00".to_string())),
            bridge,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, build_router(state)).await.unwrap() });
        TestApp {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            transport,
            bridge_rx,
        }
    }

    impl TestApp {
        async fn post(&self, path: &str) -> reqwest::Response {
            self.client.post(format!("{}{}", self.base, path)).send().await.unwrap()
        }

        async fn get_json(&self, path: &str) -> Value {
            self.client.get(format!("{}{}", self.base, path)).send().await.unwrap().json().await.unwrap()
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = spawn_app().await;
        let body = app.client.get(format!("{}/healthz", app.base)).send().await.unwrap().text().await.unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_toggle_opens_stream_and_reports_status() {
        let app = spawn_app().await;

        let toggled: Value = app.post("/monitor/toggle").await.json().await.unwrap();
        assert_eq!(toggled, json!({"visible": true}));
        assert_eq!(app.transport.open_count(), 1);

        let status = app.get_json("/monitor/status").await;
        assert_eq!(status["visible"], json!(true));
        assert_eq!(status["connection"], json!("connecting"));

        assert_eq!(app.post("/monitor/hide").await.status(), 204);
        assert_eq!(app.get_json("/monitor/status").await["visible"], json!(false));
    }

    #[tokio::test]
    async fn test_unknown_series_is_not_found() {
        let app = spawn_app().await;
        app.post("/monitor/show").await;
        assert_eq!(app.post("/monitor/series/GPU_9_LOAD/toggle").await.status(), 404);
    }

    #[tokio::test]
    async fn test_pointer_drag_round_trip() {
        let app = spawn_app().await;
        app.post("/monitor/show").await;
        let url = format!("{}/monitor/pointer", app.base);

        let outcome: Value = app
            .client
            .post(&url)
            .json(&json!({"kind": "down", "x": 70.0, "y": 70.0}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(outcome, json!({"outcome": "started", "gesture": "drag"}));
    }

    #[tokio::test]
    async fn test_recenter_and_coordinates() {
        let app = spawn_app().await;

        let outcome: Value = app.post("/layout/recenter").await.json().await.unwrap();
        assert_eq!(outcome["outcome"], "recentered");
        assert_eq!(outcome["shift"], json!([-50.0, -50.0]));

        let text = app.client.get(format!("{}/canvas/coordinates", app.base)).send().await.unwrap().text().await.unwrap();
        assert_eq!(text, "x: 0, y: 0 | zoom: 1.00");
    }

    #[tokio::test]
    async fn test_bridge_publishes_message() {
        let mut app = spawn_app().await;
        let response = app
            .client
            .post(format!("{}/bridge", app.base))
            .json(&json!({"type": "queue_prompt"}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 202);
        assert_eq!(app.bridge_rx.recv().await.unwrap(), BridgeMessage::QueuePrompt);
    }
}
