// View state store - Durable overlay geometry and series visibility
use crate::domain::view_state::ViewState;
use std::sync::Arc;
use thiserror::Error;

pub const VIEW_STATE_KEY: &str = "system_monitor.view_state";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable string key-value storage shared by the whole process.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Clone)]
pub struct ViewStateStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl ViewStateStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            key: VIEW_STATE_KEY.to_string(),
        }
    }

    /// Absent or malformed entries fall back to defaults.
    pub fn load(&self) -> ViewState {
        let Some(raw) = self.storage.get(&self.key) else {
            return ViewState::default();
        };

        match serde_json::from_str::<ViewState>(&raw) {
            Ok(mut state) => {
                state.rect = state.rect.sanitized();
                state
            }
            Err(e) => {
                tracing::debug!("Ignoring malformed view state: {}", e);
                ViewState::default()
            }
        }
    }

    /// Full overwrite of the stored state.
    pub fn save(&self, state: &ViewState) -> Result<(), StorageError> {
        let raw = serde_json::to_string(state)?;
        self.storage.set(&self.key, &raw)
    }
}
