// WebSocket transport for the telemetry stream
use crate::application::telemetry_client::{LinkEvent, LinkEventKind, LinkHandle, TelemetryTransport};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// One reader/writer task per stream; no reconnect attempts.
#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport;

impl TelemetryTransport for WebSocketTransport {
    fn open(&self, url: &Url, generation: u64, events: mpsc::UnboundedSender<LinkEvent>) -> LinkHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_link(url.clone(), generation, events, rx));
        LinkHandle::new(tx, Some(task))
    }
}

async fn run_link(
    url: Url,
    generation: u64,
    events: mpsc::UnboundedSender<LinkEvent>,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    let emit = |kind| {
        let _ = events.send(LinkEvent { generation, kind });
    };

    let ws = match connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            tracing::warn!("Telemetry stream {} failed to open: {}", url, e);
            emit(LinkEventKind::Closed);
            return;
        }
    };
    emit(LinkEventKind::Opened);

    let (mut sink, mut stream) = ws.split();
    loop {
        tokio::select! {
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => emit(LinkEventKind::Frame(text.as_str().to_owned())),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("Telemetry stream {} failed: {}", url, e);
                    break;
                }
            },
            command = outbound.recv() => match command {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        tracing::warn!("Telemetry command not sent: {}", e);
                        break;
                    }
                }
                None => {
                    let _ = sink.close().await;
                    break;
                }
            },
        }
    }
    emit(LinkEventKind::Closed);
}
