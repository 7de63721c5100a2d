// Overlay window controller - Lifecycle, gestures and sampling mode
use crate::application::chart_adapter::ChartAdapter;
use crate::application::chart_renderer::RendererFactory;
use crate::application::interaction::{GestureKind, GestureOutcome, Interaction, PointerEvent};
use crate::application::series_buffer::SeriesBuffer;
use crate::application::telemetry_client::{
    ConnectionState, LinkEvent, TelemetryStreamClient, TelemetryTransport,
};
use crate::application::view_state_store::ViewStateStore;
use crate::domain::host::HostEvent;
use crate::domain::telemetry::{DeviceSet, ModeProfiles, SamplingMode, SamplingProfile, TelemetryFrame};
use crate::domain::view_state::ViewState;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

#[derive(Debug, Clone)]
pub struct OverlaySettings {
    pub endpoint: Url,
    pub profiles: ModeProfiles,
}

/// Everything that lives only while the overlay is visible.
struct MonitorSession {
    client: TelemetryStreamClient,
    buffer: SeriesBuffer,
    chart: ChartAdapter,
    devices_discovered: bool,
}

impl MonitorSession {
    fn apply_frame(&mut self, frame: TelemetryFrame, hidden: &BTreeSet<String>) {
        if !self.devices_discovered && !frame.gpus.is_empty() {
            let devices = DeviceSet::from_frame(&frame);
            tracing::info!("Discovered {} monitored devices", devices.devices.len());
            self.chart.define_series(&devices, hidden, &mut self.buffer);
            self.devices_discovered = true;
        }
        self.chart.ingest(&frame, &mut self.buffer);
        self.chart.refresh(&self.buffer);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OverlayStatus {
    pub visible: bool,
    pub mode: SamplingMode,
    pub profile: SamplingProfile,
    pub connection: ConnectionState,
    pub view: ViewState,
    pub series: Vec<String>,
    pub gesture_active: bool,
}

pub struct OverlayController {
    settings: OverlaySettings,
    transport: Arc<dyn TelemetryTransport>,
    renderer_factory: RendererFactory,
    store: ViewStateStore,
    view: ViewState,
    interaction: Interaction,
    surface_built: bool,
    session: Option<MonitorSession>,
    mode: SamplingMode,
    link_events: mpsc::UnboundedSender<LinkEvent>,
}

impl OverlayController {
    /// Starts hidden. The returned receiver carries transport events that
    /// must be fed back through `handle_link_event`.
    pub fn new(
        settings: OverlaySettings,
        transport: Arc<dyn TelemetryTransport>,
        renderer_factory: RendererFactory,
        store: ViewStateStore,
    ) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (link_events, link_rx) = mpsc::unbounded_channel();
        let view = store.load();
        let controller = Self {
            settings,
            transport,
            renderer_factory,
            store,
            view,
            interaction: Interaction::default(),
            surface_built: false,
            session: None,
            mode: SamplingMode::Normal,
            link_events,
        };
        (controller, link_rx)
    }

    pub fn is_visible(&self) -> bool {
        self.session.is_some()
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn buffer_capacity(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.buffer.capacity())
    }

    pub fn connection(&self) -> ConnectionState {
        self.session
            .as_ref()
            .map(|s| s.client.state())
            .unwrap_or(ConnectionState::Disconnected)
    }

    pub fn show(&mut self) {
        if self.is_visible() {
            return;
        }
        if !self.surface_built {
            tracing::info!("Building system monitor surface");
            self.surface_built = true;
        }

        let profile = self.settings.profiles.profile(self.mode);
        let mut buffer = SeriesBuffer::new(profile.capacity);
        let mut chart = ChartAdapter::new((self.renderer_factory)());
        chart.define_series(&DeviceSet::default(), &self.view.hidden_series, &mut buffer);
        chart.resize(self.view.rect.width, self.view.rect.height);

        let mut client = TelemetryStreamClient::new(
            self.transport.clone(),
            self.settings.endpoint.clone(),
            self.link_events.clone(),
            self.mode,
        );
        client.connect();

        self.session = Some(MonitorSession {
            client,
            buffer,
            chart,
            devices_discovered: false,
        });
        tracing::info!("System monitor shown");
    }

    /// Closes the stream and releases the renderer; the surface is kept.
    pub fn hide(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        session.client.disconnect();
        session.chart.release();
        self.interaction = Interaction::default();
        tracing::info!("System monitor hidden");
    }

    /// Returns the new visibility.
    pub fn toggle(&mut self) -> bool {
        if self.is_visible() {
            self.hide();
        } else {
            self.show();
        }
        self.is_visible()
    }

    pub fn reconnect(&mut self) {
        if let Some(session) = &mut self.session {
            session.devices_discovered = false;
            session.client.reconnect();
        }
    }

    /// Switch the stream mode first, then resize the buffer, so the next
    /// frame lands in a buffer already sized for the new mode.
    pub fn set_turbo(&mut self, turbo: bool) {
        let mode = SamplingMode::from_turbo(turbo);
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        let profile = self.settings.profiles.profile(mode);
        tracing::info!(
            "Sampling mode {:?}: {} samples every {:?}",
            mode,
            profile.capacity,
            profile.interval
        );

        if let Some(session) = &mut self.session {
            session.client.set_mode(mode);
            session.buffer.resize_capacity(profile.capacity);
            session.chart.refresh(&session.buffer);
        }
    }

    pub fn handle_host_event(&mut self, event: HostEvent) {
        if let Some(turbo) = event.turbo_request() {
            self.set_turbo(turbo);
        }
    }

    pub fn handle_link_event(&mut self, event: LinkEvent) {
        let Some(session) = &mut self.session else {
            return;
        };
        if let Some(frame) = session.client.handle_event(event) {
            session.apply_frame(frame, &self.view.hidden_series);
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> GestureOutcome {
        if !self.is_visible() {
            return GestureOutcome::Ignored;
        }

        let outcome = self.interaction.handle(event, &mut self.view.rect);
        match outcome {
            GestureOutcome::Finished(GestureKind::Drag) => self.persist(),
            GestureOutcome::Finished(GestureKind::Resize) => {
                self.persist();
                if let Some(session) = &mut self.session {
                    session.chart.resize(self.view.rect.width, self.view.rect.height);
                }
            }
            _ => {}
        }
        outcome
    }

    /// Flip a series' visibility; `None` if the series is not on the chart.
    pub fn toggle_series(&mut self, series_id: &str) -> Option<bool> {
        let session = self.session.as_mut()?;
        if !session.chart.series().iter().any(|s| s.id == series_id) {
            return None;
        }

        let visible = self.view.toggle_series(series_id);
        session.chart.set_visible(series_id, visible);
        session.chart.rescale(&session.buffer);
        self.persist();
        Some(visible)
    }

    pub fn status(&self) -> OverlayStatus {
        OverlayStatus {
            visible: self.is_visible(),
            mode: self.mode,
            profile: self.settings.profiles.profile(self.mode),
            connection: self.connection(),
            view: self.view.clone(),
            series: self
                .session
                .as_ref()
                .map(|s| s.chart.series().iter().map(|m| m.id.clone()).collect())
                .unwrap_or_default(),
            gesture_active: self.interaction.is_active(),
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.view) {
            tracing::warn!("Failed to persist view state: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::chart_renderer::testing::RecordingRenderer;
    use crate::application::telemetry_client::LinkEventKind;
    use crate::application::telemetry_client::testing::FakeTransport;
    use crate::application::view_state_store::testing::MemoryStorage;

    struct Harness {
        controller: OverlayController,
        transport: FakeTransport,
        renderer: RecordingRenderer,
        storage: Arc<MemoryStorage>,
    }

    fn harness() -> Harness {
        let transport = FakeTransport::default();
        let renderer = RecordingRenderer::default();
        let storage = Arc::new(MemoryStorage::default());
        let settings = OverlaySettings {
            endpoint: Url::parse("ws://127.0.0.1:8188/telemetry/ws").unwrap(),
            profiles: ModeProfiles::default(),
        };
        let (controller, _rx) = OverlayController::new(
            settings,
            Arc::new(transport.clone()),
            renderer.factory(),
            ViewStateStore::new(storage.clone()),
        );
        Harness { controller, transport, renderer, storage }
    }

    fn link(h: &mut Harness, kind: LinkEventKind) {
        let generation = h.transport.last_generation();
        h.controller.handle_link_event(LinkEvent { generation, kind });
    }

    const GPU_FRAME: &str = r#"{"cpu_percent": 40, "ram": {"percent": 20, "used_gb": 6}, "gpus": [{"id": 0, "utilization_percent": 90, "memory_used_mb": 8192, "memory_total_mb": 16384}]}"#;

    #[test]
    fn test_starts_hidden_and_toggles() {
        let mut h = harness();
        assert!(!h.controller.is_visible());
        assert!(h.controller.toggle());
        assert_eq!(h.transport.open_count(), 1);
        assert_eq!(h.controller.connection(), ConnectionState::Connecting);

        assert!(!h.controller.toggle());
        assert_eq!(h.controller.connection(), ConnectionState::Disconnected);
        assert_eq!(h.renderer.snapshot().released, 1);

        assert!(h.controller.toggle());
        assert_eq!(h.transport.open_count(), 2);
    }

    #[test]
    fn test_turbo_resizes_buffer_and_commands_stream() {
        let mut h = harness();
        h.controller.show();
        link(&mut h, LinkEventKind::Opened);
        assert_eq!(h.controller.buffer_capacity(), Some(60));

        h.controller.handle_host_event(HostEvent::ExecutionStarted);
        assert_eq!(h.controller.mode(), SamplingMode::Turbo);
        assert_eq!(h.controller.buffer_capacity(), Some(300));
        assert_eq!(h.transport.sent(), vec![r#"{"cmd":"turbo_on"}"#]);

        h.controller.handle_host_event(HostEvent::Executing(Some("5".into())));
        assert_eq!(h.controller.mode(), SamplingMode::Turbo);

        h.controller.handle_host_event(HostEvent::Executing(None));
        assert_eq!(h.controller.buffer_capacity(), Some(60));
        assert_eq!(h.transport.sent(), vec![r#"{"cmd":"turbo_off"}"#]);

        h.controller.handle_host_event(HostEvent::ExecutionStarted);
        h.controller.handle_host_event(HostEvent::ExecutionError);
        assert_eq!(h.controller.mode(), SamplingMode::Normal);
        assert_eq!(h.controller.buffer_capacity(), Some(60));
    }

    #[test]
    fn test_mode_while_hidden_applies_on_show() {
        let mut h = harness();
        h.controller.handle_host_event(HostEvent::ExecutionStarted);
        h.controller.show();
        assert_eq!(h.controller.buffer_capacity(), Some(300));

        link(&mut h, LinkEventKind::Opened);
        assert_eq!(h.transport.sent(), vec![r#"{"cmd":"turbo_on"}"#]);
    }

    #[test]
    fn test_device_discovery_defines_gpu_series_once() {
        let mut h = harness();
        h.controller.show();
        link(&mut h, LinkEventKind::Opened);
        link(&mut h, LinkEventKind::Frame(r#"{"cpu_percent": 10}"#.into()));
        assert_eq!(h.controller.status().series, vec!["CPU", "RAM"]);

        link(&mut h, LinkEventKind::Frame(GPU_FRAME.into()));
        link(&mut h, LinkEventKind::Frame(GPU_FRAME.into()));
        assert_eq!(
            h.controller.status().series,
            vec!["CPU", "RAM", "GPU_0_LOAD", "GPU_0_VRAM"]
        );

        let log = h.renderer.snapshot();
        assert_eq!(log.definitions.len(), 2);
        assert_eq!(log.redraws.len(), 3);
        assert_eq!(h.renderer.last_legend("GPU_0_VRAM").as_deref(), Some("GPU 0 VRAM: 8.0 GB"));
    }

    #[test]
    fn test_reconnect_rediscovers_devices() {
        let mut h = harness();
        h.controller.show();
        link(&mut h, LinkEventKind::Opened);
        link(&mut h, LinkEventKind::Frame(GPU_FRAME.into()));
        let stale = h.transport.last_generation();
        assert_eq!(h.renderer.snapshot().definitions.len(), 2);

        h.controller.reconnect();
        assert_eq!(h.transport.open_count(), 2);
        assert_eq!(h.controller.connection(), ConnectionState::Connecting);

        h.controller.handle_link_event(LinkEvent { generation: stale, kind: LinkEventKind::Frame(GPU_FRAME.into()) });
        assert_eq!(h.renderer.snapshot().definitions.len(), 2);

        link(&mut h, LinkEventKind::Opened);
        link(&mut h, LinkEventKind::Frame(GPU_FRAME.into()));
        let log = h.renderer.snapshot();
        assert_eq!(log.definitions.len(), 3);
        assert_eq!(
            log.definitions.last().unwrap(),
            &vec!["CPU", "RAM", "GPU_0_LOAD", "GPU_0_VRAM"]
        );
    }

    #[test]
    fn test_frames_ignored_after_hide() {
        let mut h = harness();
        h.controller.show();
        let generation = h.transport.last_generation();
        h.controller.hide();
        h.controller.handle_link_event(LinkEvent {
            generation,
            kind: LinkEventKind::Frame(GPU_FRAME.into()),
        });
        assert!(h.renderer.snapshot().redraws.is_empty());
    }

    #[test]
    fn test_drag_release_persists_geometry() {
        let mut h = harness();
        h.controller.show();
        let start = h.controller.view().rect;

        h.controller.handle_pointer(PointerEvent::Down { x: start.left + 10.0, y: start.top + 10.0, on_resize_handle: false });
        h.controller.handle_pointer(PointerEvent::Move { x: start.left + 110.0, y: start.top + 60.0 });
        assert!(h.storage.entries.lock().unwrap().is_empty());
        h.controller.handle_pointer(PointerEvent::Up);

        let restored = ViewStateStore::new(h.storage.clone()).load();
        assert_eq!(restored.rect.left, start.left + 100.0);
        assert_eq!(restored.rect.top, start.top + 50.0);
    }

    #[test]
    fn test_resize_release_persists_and_relayouts() {
        let mut h = harness();
        h.controller.show();

        h.controller.handle_pointer(PointerEvent::Down { x: 0.0, y: 0.0, on_resize_handle: true });
        h.controller.handle_pointer(PointerEvent::Move { x: -1000.0, y: -1000.0 });
        assert_eq!(h.controller.handle_pointer(PointerEvent::Up), GestureOutcome::Finished(GestureKind::Resize));

        let restored = ViewStateStore::new(h.storage.clone()).load();
        assert_eq!((restored.rect.width, restored.rect.height), (250.0, 180.0));
        assert_eq!(h.renderer.snapshot().sizes.last(), Some(&(250.0, 180.0)));
    }

    #[test]
    fn test_pointer_ignored_while_hidden() {
        let mut h = harness();
        let outcome = h.controller.handle_pointer(PointerEvent::Down { x: 0.0, y: 0.0, on_resize_handle: false });
        assert_eq!(outcome, GestureOutcome::Ignored);
    }

    #[test]
    fn test_toggle_series_persists_and_survives_reshow() {
        let mut h = harness();
        h.controller.show();
        assert_eq!(h.controller.toggle_series("RAM"), Some(false));
        assert_eq!(h.controller.toggle_series("GPU_9_LOAD"), None);

        let restored = ViewStateStore::new(h.storage.clone()).load();
        assert!(restored.is_hidden("RAM"));

        h.controller.hide();
        h.controller.show();
        assert_eq!(h.controller.toggle_series("RAM"), Some(true));
    }
}
