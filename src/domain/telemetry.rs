// Telemetry wire models and sampling modes
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One sampling tick as pushed by the telemetry endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TelemetryFrame {
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub ram: Option<RamStats>,
    #[serde(default)]
    pub gpus: Vec<GpuStats>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RamStats {
    pub percent: Option<f64>,
    pub used_gb: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GpuStats {
    pub id: DeviceId,
    pub utilization_percent: Option<f64>,
    pub memory_used_mb: Option<f64>,
    pub memory_total_mb: Option<f64>,
}

impl GpuStats {
    /// Memory in use as a percentage of the device total.
    pub fn memory_percent(&self) -> Option<f64> {
        match (self.memory_used_mb, self.memory_total_mb) {
            (Some(used), Some(total)) if total > 0.0 => Some(used / total * 100.0),
            _ => None,
        }
    }
}

/// Devices report either numeric or string ids; both render the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DeviceId {
    Index(u64),
    Name(String),
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceId::Index(i) => write!(f, "{}", i),
            DeviceId::Name(n) => f.write_str(n),
        }
    }
}

impl TelemetryFrame {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// A monitored accelerator as discovered from the first frame listing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: DeviceId,
    pub memory_total_mb: Option<f64>,
}

/// Fixed for the lifetime of one connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSet {
    pub devices: Vec<Device>,
}

impl DeviceSet {
    pub fn from_frame(frame: &TelemetryFrame) -> Self {
        let devices = frame
            .gpus
            .iter()
            .map(|g| Device {
                id: g.id.clone(),
                memory_total_mb: g.memory_total_mb,
            })
            .collect();
        Self { devices }
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Outbound command frame: `{"cmd": "turbo_on" | "turbo_off"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCommand {
    pub cmd: ModeCommandKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeCommandKind {
    TurboOn,
    TurboOff,
}

impl ModeCommand {
    pub fn for_mode(mode: SamplingMode) -> Self {
        let cmd = match mode {
            SamplingMode::Normal => ModeCommandKind::TurboOff,
            SamplingMode::Turbo => ModeCommandKind::TurboOn,
        };
        Self { cmd }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    #[default]
    Normal,
    Turbo,
}

impl SamplingMode {
    pub fn from_turbo(turbo: bool) -> Self {
        if turbo {
            SamplingMode::Turbo
        } else {
            SamplingMode::Normal
        }
    }
}

/// Buffer capacity and upstream sampling interval for one mode. Always read
/// together so the on-screen time window cannot drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SamplingProfile {
    pub capacity: usize,
    #[serde(rename = "interval_ms", serialize_with = "serialize_millis")]
    pub interval: Duration,
}

impl SamplingProfile {
    pub fn new(capacity: usize, interval_ms: u64) -> Self {
        Self {
            capacity,
            interval: Duration::from_millis(interval_ms),
        }
    }

    /// Time span shown by a full buffer; saturates instead of overflowing.
    pub fn window(&self) -> Duration {
        let capacity = u32::try_from(self.capacity).unwrap_or(u32::MAX);
        self.interval.saturating_mul(capacity)
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeProfiles {
    pub normal: SamplingProfile,
    pub turbo: SamplingProfile,
}

impl Default for ModeProfiles {
    fn default() -> Self {
        Self {
            normal: SamplingProfile::new(60, 1000),
            turbo: SamplingProfile::new(300, 200),
        }
    }
}

impl ModeProfiles {
    pub fn profile(&self, mode: SamplingMode) -> SamplingProfile {
        match mode {
            SamplingMode::Normal => self.normal,
            SamplingMode::Turbo => self.turbo,
        }
    }
}
