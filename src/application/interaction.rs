// Drag and resize gestures as an explicit state machine
use crate::domain::view_state::{WindowRect, MIN_HEIGHT, MIN_WIDTH};
use serde::{Deserialize, Serialize};

/// Pointer input in page coordinates, independent of any event API.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    Down {
        x: f64,
        y: f64,
        #[serde(default)]
        on_resize_handle: bool,
    },
    Move {
        x: f64,
        y: f64,
    },
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Dragging { grab_x: f64, grab_y: f64 },
    Resizing { start_x: f64, start_y: f64, start_width: f64, start_height: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Drag,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "gesture", rename_all = "snake_case")]
pub enum GestureOutcome {
    /// Event had no meaning in the current state.
    Ignored,
    Started(GestureKind),
    Updated(GestureKind),
    /// Gesture released; geometry should be persisted.
    Finished(GestureKind),
}

/// Only one gesture can be active per pointer session.
///
/// | state    | down (body) | down (handle) | move          | up            |
/// |----------|-------------|---------------|---------------|---------------|
/// | idle     | dragging    | resizing      | ignored       | ignored       |
/// | dragging | ignored     | ignored       | move window   | idle, persist |
/// | resizing | ignored     | ignored       | resize window | idle, persist |
#[derive(Debug, Clone, Copy)]
pub struct Interaction {
    gesture: Gesture,
}

impl Default for Interaction {
    fn default() -> Self {
        Self { gesture: Gesture::Idle }
    }
}

impl Interaction {
    /// Move/up events only need routing here while this is true.
    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    pub fn active_kind(&self) -> Option<GestureKind> {
        match self.gesture {
            Gesture::Idle => None,
            Gesture::Dragging { .. } => Some(GestureKind::Drag),
            Gesture::Resizing { .. } => Some(GestureKind::Resize),
        }
    }

    pub fn handle(&mut self, event: PointerEvent, rect: &mut WindowRect) -> GestureOutcome {
        match (self.gesture, event) {
            (Gesture::Idle, PointerEvent::Down { x, y, on_resize_handle: false }) => {
                self.gesture = Gesture::Dragging {
                    grab_x: x - rect.left,
                    grab_y: y - rect.top,
                };
                GestureOutcome::Started(GestureKind::Drag)
            }
            (Gesture::Idle, PointerEvent::Down { x, y, on_resize_handle: true }) => {
                self.gesture = Gesture::Resizing {
                    start_x: x,
                    start_y: y,
                    start_width: rect.width,
                    start_height: rect.height,
                };
                GestureOutcome::Started(GestureKind::Resize)
            }
            (Gesture::Dragging { grab_x, grab_y }, PointerEvent::Move { x, y }) => {
                rect.left = x - grab_x;
                rect.top = y - grab_y;
                GestureOutcome::Updated(GestureKind::Drag)
            }
            (Gesture::Resizing { start_x, start_y, start_width, start_height }, PointerEvent::Move { x, y }) => {
                rect.width = (start_width + (x - start_x)).max(MIN_WIDTH);
                rect.height = (start_height + (y - start_y)).max(MIN_HEIGHT);
                GestureOutcome::Updated(GestureKind::Resize)
            }
            (Gesture::Dragging { .. }, PointerEvent::Up) => {
                self.gesture = Gesture::Idle;
                GestureOutcome::Finished(GestureKind::Drag)
            }
            (Gesture::Resizing { .. }, PointerEvent::Up) => {
                self.gesture = Gesture::Idle;
                GestureOutcome::Finished(GestureKind::Resize)
            }
            _ => GestureOutcome::Ignored,
        }
    }
}
