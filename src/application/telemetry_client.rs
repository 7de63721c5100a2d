// Telemetry stream client - Connection state machine and mode commands
use crate::domain::telemetry::{ModeCommand, SamplingMode, TelemetryFrame};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

/// Generation 0 is never issued, so it can mark "no live connection".
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("telemetry link is closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEventKind {
    Opened,
    Frame(String),
    Closed,
}

/// Inbound event tagged with the connection it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEvent {
    pub generation: u64,
    pub kind: LinkEventKind,
}

/// Outbound side of one open stream. Dropping it tears the stream down.
pub struct LinkHandle {
    outbound: mpsc::UnboundedSender<String>,
    task: Option<JoinHandle<()>>,
}

impl LinkHandle {
    pub fn new(outbound: mpsc::UnboundedSender<String>, task: Option<JoinHandle<()>>) -> Self {
        Self { outbound, task }
    }

    pub fn send(&self, text: String) -> Result<(), TransportError> {
        self.outbound.send(text).map_err(|_| TransportError::Closed)
    }
}

impl Drop for LinkHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Opens duplex streams. Events for the stream are sent to `events` tagged
/// with `generation`; an `Opened` event precedes any frame and a `Closed`
/// event ends the stream, including when opening fails.
pub trait TelemetryTransport: Send + Sync {
    fn open(&self, url: &Url, generation: u64, events: mpsc::UnboundedSender<LinkEvent>) -> LinkHandle;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

pub struct TelemetryStreamClient {
    transport: Arc<dyn TelemetryTransport>,
    endpoint: Url,
    events: mpsc::UnboundedSender<LinkEvent>,
    state: ConnectionState,
    generation: u64,
    link: Option<LinkHandle>,
    desired_mode: SamplingMode,
}

impl TelemetryStreamClient {
    pub fn new(
        transport: Arc<dyn TelemetryTransport>,
        endpoint: Url,
        events: mpsc::UnboundedSender<LinkEvent>,
        desired_mode: SamplingMode,
    ) -> Self {
        Self {
            transport,
            endpoint,
            events,
            state: ConnectionState::Disconnected,
            generation: 0,
            link: None,
            desired_mode,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn desired_mode(&self) -> SamplingMode {
        self.desired_mode
    }

    /// No-op unless disconnected.
    pub fn connect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            return;
        }
        self.generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        tracing::info!("Connecting telemetry stream {} (#{})", self.endpoint, self.generation);
        self.link = Some(self.transport.open(&self.endpoint, self.generation, self.events.clone()));
        self.state = ConnectionState::Connecting;
    }

    /// Safe to call when not connected.
    pub fn disconnect(&mut self) {
        if self.link.take().is_some() {
            tracing::info!("Closed telemetry stream #{}", self.generation);
        }
        self.state = ConnectionState::Disconnected;
        self.generation = 0;
    }

    pub fn reconnect(&mut self) {
        self.disconnect();
        self.connect();
    }

    /// Sends the mode command when connected; otherwise the mode is kept and
    /// asserted as soon as the next connection opens. Returns whether a
    /// command went out.
    pub fn set_mode(&mut self, mode: SamplingMode) -> bool {
        self.desired_mode = mode;
        if self.state != ConnectionState::Connected {
            tracing::debug!("Telemetry not connected, {:?} mode pending", mode);
            return false;
        }
        self.send_mode(mode)
    }

    fn send_mode(&self, mode: SamplingMode) -> bool {
        let Some(link) = &self.link else {
            return false;
        };
        let command = match ModeCommand::for_mode(mode).to_json() {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!("Failed to encode {:?} mode command: {}", mode, e);
                return false;
            }
        };
        match link.send(command) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to send {:?} mode command: {}", mode, e);
                false
            }
        }
    }

    /// Apply a transport event; returns the parsed frame for frame events of
    /// the live connection. Malformed frames are dropped.
    pub fn handle_event(&mut self, event: LinkEvent) -> Option<TelemetryFrame> {
        if event.generation == 0 || event.generation != self.generation {
            return None;
        }

        match event.kind {
            LinkEventKind::Opened => {
                tracing::info!("Telemetry stream #{} connected", self.generation);
                self.state = ConnectionState::Connected;
                // the server starts every connection in normal mode
                if self.desired_mode != SamplingMode::Normal {
                    self.send_mode(self.desired_mode);
                }
                None
            }
            LinkEventKind::Frame(text) => match TelemetryFrame::parse(&text) {
                Ok(frame) => Some(frame),
                Err(e) => {
                    tracing::debug!("Dropping malformed telemetry frame: {}", e);
                    None
                }
            },
            LinkEventKind::Closed => {
                tracing::info!("Telemetry stream #{} closed", self.generation);
                self.link = None;
                self.state = ConnectionState::Disconnected;
                self.generation = 0;
                None
            }
        }
    }
}

impl Drop for TelemetryStreamClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
