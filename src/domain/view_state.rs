// Persisted overlay geometry and series visibility
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const MIN_WIDTH: f64 = 250.0;
pub const MIN_HEIGHT: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for WindowRect {
    fn default() -> Self {
        Self {
            top: 60.0,
            left: 60.0,
            width: 420.0,
            height: 240.0,
        }
    }
}

impl WindowRect {
    /// Enforce the minimum size and replace non-finite fields with defaults.
    pub fn sanitized(self) -> Self {
        let fallback = Self::default();
        let pick = |v: f64, d: f64| if v.is_finite() { v } else { d };
        Self {
            top: pick(self.top, fallback.top),
            left: pick(self.left, fallback.left),
            width: pick(self.width, fallback.width).max(MIN_WIDTH),
            height: pick(self.height, fallback.height).max(MIN_HEIGHT),
        }
    }
}

/// Stored as `{top, left, width, height, hiddenDatasets}` under one key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(flatten)]
    pub rect: WindowRect,
    #[serde(rename = "hiddenDatasets", default)]
    pub hidden_series: BTreeSet<String>,
}

impl ViewState {
    pub fn is_hidden(&self, series_id: &str) -> bool {
        self.hidden_series.contains(series_id)
    }

    /// Flip visibility; returns whether the series is now visible.
    pub fn toggle_series(&mut self, series_id: &str) -> bool {
        if self.hidden_series.remove(series_id) {
            true
        } else {
            self.hidden_series.insert(series_id.to_string());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let mut state = ViewState::default();
        state.hidden_series.insert("GPU_0_LOAD".to_string());
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["top"], 60.0);
        assert_eq!(json["width"], 420.0);
        assert_eq!(json["hiddenDatasets"][0], "GPU_0_LOAD");
    }

    #[test]
    fn test_toggle_series() {
        let mut state = ViewState::default();
        assert!(!state.toggle_series("CPU"));
        assert!(state.is_hidden("CPU"));
        assert!(state.toggle_series("CPU"));
        assert!(!state.is_hidden("CPU"));
    }

    #[test]
    fn test_sanitized_enforces_minimums() {
        let rect = WindowRect { top: f64::NAN, left: 5.0, width: 10.0, height: 500.0 }.sanitized();
        assert_eq!(rect.top, 60.0);
        assert_eq!(rect.left, 5.0);
        assert_eq!(rect.width, MIN_WIDTH);
        assert_eq!(rect.height, 500.0);
    }
}
