// Chart adapter - Domain series to renderer series, axis scaling and labels
use crate::application::chart_renderer::{ChartRenderer, SeriesUpdate};
use crate::application::series_buffer::{Sample, SeriesBuffer};
use crate::domain::series::{catalogue, MetricSeries};
use crate::domain::telemetry::{DeviceSet, TelemetryFrame};
use std::collections::BTreeSet;

/// Gap kept between the lowest visible value and the axis floor.
const AXIS_MARGIN: f64 = 5.0;
/// A plateau near 100 still gets a visible floor below it.
const MAX_FLOOR_CANDIDATE: f64 = 95.0;
pub const NO_DATA_LABEL: &str = "--";

pub struct ChartAdapter {
    renderer: Box<dyn ChartRenderer>,
    series: Vec<MetricSeries>,
    axis_floor: f64,
}

impl ChartAdapter {
    pub fn new(renderer: Box<dyn ChartRenderer>) -> Self {
        Self {
            renderer,
            series: Vec::new(),
            axis_floor: 0.0,
        }
    }

    pub fn series(&self) -> &[MetricSeries] {
        &self.series
    }

    pub fn axis_floor(&self) -> f64 {
        self.axis_floor
    }

    /// (Re)build series definitions for the given devices and make the buffer
    /// hold exactly those series.
    pub fn define_series(
        &mut self,
        devices: &DeviceSet,
        hidden: &BTreeSet<String>,
        buffer: &mut SeriesBuffer,
    ) {
        let mut series = catalogue(devices);
        for s in &mut series {
            s.visible = !hidden.contains(&s.id);
            buffer.ensure_series(&s.id);
        }
        buffer.retain_series(series.iter().map(|s| s.id.as_str()));

        tracing::debug!("Defining {} chart series", series.len());
        self.renderer.define_series(&series);
        self.renderer.set_axis_floor(self.axis_floor);
        self.series = series;
    }

    /// Append one sample per defined series; series missing from the frame get an empty slot.
    pub fn ingest(&self, frame: &TelemetryFrame, buffer: &mut SeriesBuffer) {
        for s in &self.series {
            buffer.push(&s.id, s.source.sample(frame));
        }
    }

    /// Push buffer contents, rescale the axis from visible series and redraw.
    pub fn refresh(&mut self, buffer: &SeriesBuffer) {
        for s in &self.series {
            if let Some(samples) = buffer.samples(&s.id) {
                let samples: Vec<Sample> = samples.iter().copied().collect();
                let legend = legend_text(s, &samples);
                self.renderer.push_samples(SeriesUpdate {
                    id: &s.id,
                    samples: &samples,
                    legend: &legend,
                });
            }
        }
        self.rescale(buffer);
    }

    /// Recompute the axis floor only; used after visibility changes.
    pub fn rescale(&mut self, buffer: &SeriesBuffer) {
        let minimum = buffer.visible_minimum(|id| self.is_visible(id));
        let floor = axis_floor(minimum);
        if floor != self.axis_floor {
            self.axis_floor = floor;
            self.renderer.set_axis_floor(floor);
        }
        // every frame is a full cadence tick, animation would lag behind it
        self.renderer.redraw(false);
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.series.iter().any(|s| s.id == id && s.visible)
    }

    /// Returns false when the series is not defined.
    pub fn set_visible(&mut self, id: &str, visible: bool) -> bool {
        match self.series.iter_mut().find(|s| s.id == id) {
            Some(s) => {
                s.visible = visible;
                self.renderer.set_series_visible(id, visible);
                true
            }
            None => false,
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.renderer.resize(width, height);
    }

    pub fn release(mut self) {
        self.renderer.release();
    }
}

/// Axis floor for the lowest visible value: 5 below it, clamped to `[0, 90]`.
pub fn axis_floor(visible_minimum: Option<f64>) -> f64 {
    let candidate = visible_minimum.unwrap_or(0.0).clamp(0.0, MAX_FLOOR_CANDIDATE);
    (candidate - AXIS_MARGIN).floor().max(0.0)
}

/// Display a value in the series' unit.
pub fn format_value(series: &MetricSeries, value: f64) -> String {
    match (series.memory_ratio, series.capacity_mb) {
        (true, Some(capacity_mb)) => {
            let used_mb = value / 100.0 * capacity_mb;
            format!("{:.1} GB", used_mb / 1024.0)
        }
        _ => format!("{:.1}%", value),
    }
}

/// Latest non-null sample formatted, scanning back from the newest slot.
pub fn latest_label(series: &MetricSeries, samples: &[Sample]) -> String {
    samples
        .iter()
        .rev()
        .find_map(|s| *s)
        .map(|v| format_value(series, v))
        .unwrap_or_else(|| NO_DATA_LABEL.to_string())
}

pub fn legend_text(series: &MetricSeries, samples: &[Sample]) -> String {
    format!("{}: {}", series.label, latest_label(series, samples))
}
