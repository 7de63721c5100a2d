// Application state for HTTP handlers
use crate::application::overlay_service::OverlayHandle;
use crate::domain::host::BridgeMessage;
use crate::infrastructure::snapshot_renderer::SharedSnapshot;
use crate::infrastructure::workspace::SharedWorkspace;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub overlay: OverlayHandle,
    pub chart: SharedSnapshot,
    pub workspace: SharedWorkspace,
    /// Latest coordinate readout text.
    pub readout: Arc<RwLock<String>>,
    pub bridge: broadcast::Sender<BridgeMessage>,
}
