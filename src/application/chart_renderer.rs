// Renderer trait for the charting surface
use crate::application::series_buffer::Sample;
use crate::domain::series::MetricSeries;

/// Data for one series as handed to the renderer on each frame.
#[derive(Debug, Clone, Copy)]
pub struct SeriesUpdate<'a> {
    pub id: &'a str,
    pub samples: &'a [Sample],
    /// Legend and tooltip text for the latest sample.
    pub legend: &'a str,
}

/// Minimal surface a charting backend has to provide.
pub trait ChartRenderer: Send {
    /// Replace all series definitions, including their initial visibility.
    fn define_series(&mut self, series: &[MetricSeries]);

    fn push_samples(&mut self, update: SeriesUpdate<'_>);

    fn set_series_visible(&mut self, id: &str, visible: bool);

    fn set_axis_floor(&mut self, floor: f64);

    fn redraw(&mut self, animate: bool);

    fn resize(&mut self, width: f64, height: f64);

    /// Free backend resources; the renderer is not used afterwards.
    fn release(&mut self) {}
}

/// Builds a fresh renderer each time the overlay is shown.
pub type RendererFactory = Box<dyn Fn() -> Box<dyn ChartRenderer> + Send>;
