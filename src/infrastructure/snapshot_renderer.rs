// Snapshot renderer - Keeps the latest chart state for HTTP clients to draw
use crate::application::chart_renderer::{ChartRenderer, RendererFactory, SeriesUpdate};
use crate::application::series_buffer::Sample;
use crate::domain::series::MetricSeries;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSnapshot {
    pub id: String,
    pub label: String,
    pub color: String,
    pub visible: bool,
    pub legend: String,
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSnapshot {
    /// False once the overlay has released the chart.
    pub active: bool,
    pub series: Vec<SeriesSnapshot>,
    pub axis_floor: f64,
    pub axis_ceiling: f64,
    pub width: f64,
    pub height: f64,
    pub redraws: u64,
    pub animated: bool,
    pub last_frame_at: Option<DateTime<Utc>>,
}

pub type SharedSnapshot = Arc<RwLock<ChartSnapshot>>;

pub struct SnapshotRenderer {
    target: SharedSnapshot,
    pending: ChartSnapshot,
}

impl SnapshotRenderer {
    pub fn new(target: SharedSnapshot) -> Self {
        Self {
            target,
            pending: ChartSnapshot {
                active: true,
                axis_ceiling: 100.0,
                ..Default::default()
            },
        }
    }

    /// A factory whose renderers all publish into `target`.
    pub fn factory(target: SharedSnapshot) -> RendererFactory {
        Box::new(move || Box::new(SnapshotRenderer::new(target.clone())))
    }

    fn publish(&self) {
        match self.target.write() {
            Ok(mut current) => *current = self.pending.clone(),
            Err(_) => tracing::warn!("Chart snapshot lock poisoned"),
        }
    }

    fn series_mut(&mut self, id: &str) -> Option<&mut SeriesSnapshot> {
        self.pending.series.iter_mut().find(|s| s.id == id)
    }
}

impl ChartRenderer for SnapshotRenderer {
    fn define_series(&mut self, series: &[MetricSeries]) {
        self.pending.series = series
            .iter()
            .map(|s| SeriesSnapshot {
                id: s.id.clone(),
                label: s.label.clone(),
                color: s.color.clone(),
                visible: s.visible,
                legend: String::new(),
                samples: Vec::new(),
            })
            .collect();
    }

    fn push_samples(&mut self, update: SeriesUpdate<'_>) {
        if let Some(series) = self.series_mut(update.id) {
            series.samples = update.samples.to_vec();
            series.legend = update.legend.to_string();
        }
        self.pending.last_frame_at = Some(Utc::now());
    }

    fn set_series_visible(&mut self, id: &str, visible: bool) {
        if let Some(series) = self.series_mut(id) {
            series.visible = visible;
        }
    }

    fn set_axis_floor(&mut self, floor: f64) {
        self.pending.axis_floor = floor;
    }

    fn redraw(&mut self, animate: bool) {
        self.pending.redraws += 1;
        self.pending.animated = animate;
        self.publish();
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.pending.width = width;
        self.pending.height = height;
        self.publish();
    }

    fn release(&mut self) {
        self.pending = ChartSnapshot::default();
        self.publish();
    }
}
