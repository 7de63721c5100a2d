// Overlay service - Single task owning the controller, driven by commands
use crate::application::interaction::{GestureOutcome, PointerEvent};
use crate::application::overlay_controller::{OverlayController, OverlayStatus};
use crate::application::telemetry_client::LinkEvent;
use crate::domain::host::HostEvent;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Error)]
#[error("overlay service has stopped")]
pub struct OverlayStopped;

pub enum OverlayCommand {
    Show,
    Hide,
    Toggle(oneshot::Sender<bool>),
    Reconnect,
    Pointer(PointerEvent, oneshot::Sender<GestureOutcome>),
    ToggleSeries(String, oneshot::Sender<Option<bool>>),
    Status(oneshot::Sender<OverlayStatus>),
    Host(HostEvent),
}

/// The one handle the hosting shell passes to whoever needs the overlay.
#[derive(Clone)]
pub struct OverlayHandle {
    tx: mpsc::Sender<OverlayCommand>,
}

impl OverlayHandle {
    async fn send(&self, command: OverlayCommand) -> Result<(), OverlayStopped> {
        self.tx.send(command).await.map_err(|_| OverlayStopped)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> OverlayCommand,
    ) -> Result<T, OverlayStopped> {
        let (reply, rx) = oneshot::channel();
        self.send(command(reply)).await?;
        rx.await.map_err(|_| OverlayStopped)
    }

    pub async fn show(&self) -> Result<(), OverlayStopped> {
        self.send(OverlayCommand::Show).await
    }

    pub async fn hide(&self) -> Result<(), OverlayStopped> {
        self.send(OverlayCommand::Hide).await
    }

    pub async fn toggle(&self) -> Result<bool, OverlayStopped> {
        self.request(OverlayCommand::Toggle).await
    }

    pub async fn reconnect(&self) -> Result<(), OverlayStopped> {
        self.send(OverlayCommand::Reconnect).await
    }

    pub async fn pointer(&self, event: PointerEvent) -> Result<GestureOutcome, OverlayStopped> {
        self.request(|reply| OverlayCommand::Pointer(event, reply)).await
    }

    pub async fn toggle_series(&self, series_id: String) -> Result<Option<bool>, OverlayStopped> {
        self.request(|reply| OverlayCommand::ToggleSeries(series_id, reply)).await
    }

    pub async fn status(&self) -> Result<OverlayStatus, OverlayStopped> {
        self.request(OverlayCommand::Status).await
    }

    pub async fn host_event(&self, event: HostEvent) -> Result<(), OverlayStopped> {
        self.send(OverlayCommand::Host(event)).await
    }
}

pub struct OverlayService {
    controller: OverlayController,
    commands: mpsc::Receiver<OverlayCommand>,
    link_events: mpsc::UnboundedReceiver<LinkEvent>,
}

impl OverlayService {
    pub fn new(
        controller: OverlayController,
        link_events: mpsc::UnboundedReceiver<LinkEvent>,
    ) -> (Self, OverlayHandle) {
        let (tx, commands) = mpsc::channel(64);
        let service = Self {
            controller,
            commands,
            link_events,
        };
        (service, OverlayHandle { tx })
    }

    /// Runs until every handle is dropped; the overlay is hidden on exit so
    /// no stream outlives the service.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.dispatch(command),
                    None => break,
                },
                Some(event) = self.link_events.recv() => self.controller.handle_link_event(event),
            }
        }
        self.controller.hide();
        tracing::debug!("Overlay service stopped");
    }

    fn dispatch(&mut self, command: OverlayCommand) {
        // a dropped reply receiver only means the caller went away
        match command {
            OverlayCommand::Show => self.controller.show(),
            OverlayCommand::Hide => self.controller.hide(),
            OverlayCommand::Toggle(reply) => {
                let _ = reply.send(self.controller.toggle());
            }
            OverlayCommand::Reconnect => self.controller.reconnect(),
            OverlayCommand::Pointer(event, reply) => {
                let _ = reply.send(self.controller.handle_pointer(event));
            }
            OverlayCommand::ToggleSeries(id, reply) => {
                let _ = reply.send(self.controller.toggle_series(&id));
            }
            OverlayCommand::Status(reply) => {
                let _ = reply.send(self.controller.status());
            }
            OverlayCommand::Host(event) => self.controller.handle_host_event(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::chart_renderer::testing::RecordingRenderer;
    use crate::application::overlay_controller::OverlaySettings;
    use crate::application::telemetry_client::testing::FakeTransport;
    use crate::application::view_state_store::ViewStateStore;
    use crate::application::view_state_store::testing::MemoryStorage;
    use crate::domain::telemetry::{ModeProfiles, SamplingMode};
    use std::sync::Arc;
    use url::Url;

    fn spawn_service() -> (OverlayHandle, FakeTransport, tokio::task::JoinHandle<()>) {
        let transport = FakeTransport::default();
        let settings = OverlaySettings {
            endpoint: Url::parse("ws://localhost/telemetry/ws").unwrap(),
            profiles: ModeProfiles::default(),
        };
        let (controller, link_rx) = OverlayController::new(
            settings,
            Arc::new(transport.clone()),
            RecordingRenderer::default().factory(),
            ViewStateStore::new(Arc::new(MemoryStorage::default())),
        );
        let (service, handle) = OverlayService::new(controller, link_rx);
        (handle, transport, tokio::spawn(service.run()))
    }

    #[tokio::test]
    async fn test_handle_drives_controller() {
        let (handle, transport, _task) = spawn_service();

        assert!(handle.toggle().await.unwrap());
        assert_eq!(transport.open_count(), 1);

        handle.host_event(HostEvent::ExecutionStarted).await.unwrap();
        let status = handle.status().await.unwrap();
        assert!(status.visible);
        assert_eq!(status.mode, SamplingMode::Turbo);
        assert_eq!(status.profile.capacity, 300);

        assert_eq!(handle.toggle_series("CPU".into()).await.unwrap(), Some(false));
        assert!(!handle.toggle().await.unwrap());
    }

    #[tokio::test]
    async fn test_service_stops_when_handles_dropped() {
        let (handle, _transport, task) = spawn_service();
        handle.show().await.unwrap();
        drop(handle);
        task.await.unwrap();
    }
}
