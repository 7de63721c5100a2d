// Coordinate readout - Periodic display of the view center and zoom
use crate::domain::graph::Viewport;
use std::sync::{RwLock, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

const MIN_PERIOD: Duration = Duration::from_millis(1);

pub trait ViewportSource: Send + Sync {
    fn viewport(&self) -> Viewport;
}

pub fn format_readout(viewport: &Viewport) -> String {
    let [x, y] = viewport.center_in_graph();
    format!("x: {:.0}, y: {:.0} | zoom: {:.2}", x, y, viewport.scale)
}

/// Refresh `display` every `period`. The task ends on the first tick where
/// either the source or the display has been dropped. A zero period is
/// raised to 1 ms.
pub fn spawn_coordinate_poll(
    source: Weak<dyn ViewportSource>,
    display: Weak<RwLock<String>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period.max(MIN_PERIOD));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let (Some(source), Some(display)) = (source.upgrade(), display.upgrade()) else {
                break;
            };
            let text = format_readout(&source.viewport());
            match display.write() {
                Ok(mut current) => *current = text,
                Err(_) => break,
            }
        }
        tracing::debug!("Coordinate poll stopped");
    })
}
