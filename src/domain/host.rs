// Host lifecycle notifications and cross-window bridge messages
use serde::{Deserialize, Serialize};

/// Execution lifecycle notifications published by the host's event bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    ExecutionStarted,
    ExecutionError,
    /// `None` means the host is executing nothing.
    Executing(Option<String>),
}

impl HostEvent {
    /// Turbo sampling requested by this event, if it changes the mode at all.
    pub fn turbo_request(&self) -> Option<bool> {
        match self {
            HostEvent::ExecutionStarted => Some(true),
            HostEvent::ExecutionError => Some(false),
            HostEvent::Executing(None) => Some(false),
            HostEvent::Executing(Some(_)) => None,
        }
    }
}

/// Commands sent by the profiler window. Unknown types deserialize to `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeMessage {
    GetWorkflowForProfiler,
    QueuePrompt,
    #[serde(other)]
    Unknown,
}
