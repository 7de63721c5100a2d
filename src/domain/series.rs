// Metric series definitions
use super::telemetry::{DeviceId, DeviceSet, TelemetryFrame};
use serde::Serialize;

pub const CPU_SERIES: &str = "CPU";
pub const RAM_SERIES: &str = "RAM";

const PALETTE: [&str; 8] = [
    "#4fc3f7", "#81c784", "#ffb74d", "#e57373", "#ba68c8", "#fff176", "#4db6ac", "#f06292",
];

/// Where a series takes its value from in a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "device")]
pub enum SeriesSource {
    Cpu,
    Ram,
    GpuLoad(DeviceId),
    GpuMemory(DeviceId),
}

impl SeriesSource {
    pub fn sample(&self, frame: &TelemetryFrame) -> Option<f64> {
        match self {
            SeriesSource::Cpu => frame.cpu_percent,
            SeriesSource::Ram => frame.ram.as_ref().and_then(|r| r.percent),
            SeriesSource::GpuLoad(id) => frame
                .gpus
                .iter()
                .find(|g| &g.id == id)
                .and_then(|g| g.utilization_percent),
            SeriesSource::GpuMemory(id) => frame
                .gpus
                .iter()
                .find(|g| &g.id == id)
                .and_then(|g| g.memory_percent()),
        }
    }
}

/// One chart line. Samples live in the series buffer under `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    pub id: String,
    pub label: String,
    pub color: String,
    pub source: SeriesSource,
    /// Values are memory ratios and may be shown in absolute units.
    pub memory_ratio: bool,
    /// Absolute capacity in MB used to turn a ratio back into GB.
    pub capacity_mb: Option<f64>,
    pub visible: bool,
}

impl MetricSeries {
    fn new(id: String, label: String, source: SeriesSource) -> Self {
        Self {
            id,
            label,
            color: String::new(),
            source,
            memory_ratio: false,
            capacity_mb: None,
            visible: true,
        }
    }

    fn memory(mut self, capacity_mb: Option<f64>) -> Self {
        self.memory_ratio = true;
        self.capacity_mb = capacity_mb;
        self
    }
}

pub fn gpu_load_id(id: &DeviceId) -> String {
    format!("GPU_{}_LOAD", id)
}

pub fn gpu_memory_id(id: &DeviceId) -> String {
    format!("GPU_{}_VRAM", id)
}

/// Build the series catalogue: CPU and RAM always, then load and VRAM per device.
pub fn catalogue(devices: &DeviceSet) -> Vec<MetricSeries> {
    let mut series = vec![
        MetricSeries::new(CPU_SERIES.to_string(), "CPU".to_string(), SeriesSource::Cpu),
        MetricSeries::new(RAM_SERIES.to_string(), "RAM".to_string(), SeriesSource::Ram).memory(None),
    ];

    for device in &devices.devices {
        series.push(MetricSeries::new(
            gpu_load_id(&device.id),
            format!("GPU {} Load", device.id),
            SeriesSource::GpuLoad(device.id.clone()),
        ));
        series.push(
            MetricSeries::new(
                gpu_memory_id(&device.id),
                format!("GPU {} VRAM", device.id),
                SeriesSource::GpuMemory(device.id.clone()),
            )
            .memory(device.memory_total_mb),
        );
    }

    for (i, s) in series.iter_mut().enumerate() {
        s.color = PALETTE[i % PALETTE.len()].to_string();
    }

    series
}
