// Host event feed - Execution lifecycle notifications from the host's event bus
use crate::application::overlay_service::OverlayHandle;
use crate::domain::host::HostEvent;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

const MIN_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// Map a host bus message to a lifecycle event; everything else is `None`.
pub fn parse_host_event(text: &str) -> Option<HostEvent> {
    let envelope: Envelope = serde_json::from_str(text).ok()?;
    match envelope.kind.as_str() {
        "execution_start" => Some(HostEvent::ExecutionStarted),
        "execution_error" => Some(HostEvent::ExecutionError),
        "executing" => {
            let node = match envelope.data.get("node") {
                Some(Value::String(id)) => Some(id.clone()),
                Some(Value::Number(id)) => Some(id.to_string()),
                _ => None,
            };
            Some(HostEvent::Executing(node))
        }
        _ => None,
    }
}

/// Forward host lifecycle events to the overlay until the overlay stops.
pub async fn run_host_feed(url: Url, overlay: OverlayHandle) {
    let mut backoff = MIN_BACKOFF;
    loop {
        match connect_async(url.as_str()).await {
            Ok((mut ws, _)) => {
                tracing::info!("Subscribed to host events at {}", url);
                backoff = MIN_BACKOFF;
                while let Some(message) = ws.next().await {
                    match message {
                        Ok(Message::Text(text)) => {
                            if let Some(event) = parse_host_event(text.as_str()) {
                                if overlay.host_event(event).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!("Host event stream failed: {}", e);
                            break;
                        }
                    }
                }
                tracing::info!("Host event stream closed");
            }
            Err(e) => {
                tracing::warn!("Host event stream {} unavailable: {}", url, e);
            }
        }

        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_messages() {
        assert_eq!(parse_host_event(r#"{"type":"execution_start","data":{"prompt_id":"a"}}"#), Some(HostEvent::ExecutionStarted));
        assert_eq!(parse_host_event(r#"{"type":"execution_error","data":{}}"#), Some(HostEvent::ExecutionError));
        assert_eq!(parse_host_event(r#"{"type":"executing","data":{"node":null}}"#), Some(HostEvent::Executing(None)));
        assert_eq!(
            parse_host_event(r#"{"type":"executing","data":{"node":"12"}}"#),
            Some(HostEvent::Executing(Some("12".to_string())))
        );
    }

    #[test]
    fn test_other_messages_ignored() {
        assert_eq!(parse_host_event(r#"{"type":"progress","data":{"value":1}}"#), None);
        assert_eq!(parse_host_event("garbage"), None);
    }
}
