// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    time::Duration,
};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::application::bridge_listener::BridgeListener;
use crate::application::coordinate_readout::{spawn_coordinate_poll, ViewportSource};
use crate::application::endpoint::{http_endpoint, telemetry_endpoint, ws_endpoint};
use crate::application::overlay_controller::{OverlayController, OverlaySettings};
use crate::application::overlay_service::OverlayService;
use crate::application::view_state_store::ViewStateStore;
use crate::domain::graph::Viewport;
use crate::infrastructure::config::load_panels_config;
use crate::infrastructure::file_storage::FileStorage;
use crate::infrastructure::host_api::{HostApi, PromptQueue};
use crate::infrastructure::host_events::run_host_feed;
use crate::infrastructure::snapshot_renderer::{SharedSnapshot, SnapshotRenderer};
use crate::infrastructure::websocket_transport::WebSocketTransport;
use crate::infrastructure::workspace::{SharedWorkspace, Workspace};
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_panels_config()?;
    let page = Url::parse(&config.host.url)?;
    let base = config.host.base_path.as_str();

    // Host workspace (infrastructure layer)
    let viewport = Viewport {
        width: config.canvas.width,
        height: config.canvas.height,
        ..Default::default()
    };
    let workspace = match &config.canvas.workflow_path {
        Some(path) => Workspace::load(path, viewport)?,
        None => Workspace::new(None, viewport),
    };
    let workspace = SharedWorkspace::new(workspace);

    // Overlay (application layer)
    let chart = SharedSnapshot::default();
    let settings = OverlaySettings {
        endpoint: telemetry_endpoint(&page, base)?,
        profiles: config.monitor.profiles(),
    };
    let state_dir = config.monitor.state_dir();
    tracing::info!("Keeping overlay state in {}", state_dir.display());
    let (controller, link_rx) = OverlayController::new(
        settings,
        Arc::new(WebSocketTransport),
        SnapshotRenderer::factory(chart.clone()),
        ViewStateStore::new(Arc::new(FileStorage::new(state_dir))),
    );
    let (service, overlay) = OverlayService::new(controller, link_rx);
    tokio::spawn(service.run());

    tokio::spawn(run_host_feed(ws_endpoint(&page, base, "ws")?, overlay.clone()));

    // Profiler bridge
    let api = HostApi::new(
        http_endpoint(&page, base, &config.bridge.context_path)?,
        http_endpoint(&page, base, "prompt")?,
    );
    let source = Arc::new(workspace.clone());
    let listener = BridgeListener::new(
        source.clone(),
        Arc::new(api.clone()),
        Arc::new(PromptQueue::new(api, source)),
    );
    let (bridge, bridge_rx) = broadcast::channel(16);
    tokio::spawn(listener.run(bridge_rx));

    // Coordinate readout
    let readout = Arc::new(RwLock::new(String::new()));
    let viewport_source: Arc<dyn ViewportSource> = Arc::new(workspace.clone());
    spawn_coordinate_poll(
        Arc::downgrade(&viewport_source),
        Arc::downgrade(&readout),
        Duration::from_millis(config.canvas.coordinate_poll_ms),
    );

    let state = Arc::new(AppState {
        overlay: overlay.clone(),
        chart,
        workspace,
        readout,
        bridge,
    });

    // Start server
    let addr: SocketAddr = config.server.listen.parse()?;
    tracing::info!("Starting node-panels on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    // Close the telemetry stream before exit; the status reply means the hide was applied
    overlay.hide().await?;
    overlay.status().await?;

    Ok(())
}
