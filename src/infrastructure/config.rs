use crate::domain::telemetry::{ModeProfiles, SamplingProfile};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct PanelsConfig {
    pub host: HostSettings,
    pub server: ServerSettings,
    pub monitor: MonitorSettings,
    pub canvas: CanvasSettings,
    pub bridge: BridgeSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HostSettings {
    /// Origin of the page hosting the editor, e.g. `http://127.0.0.1:8188/`.
    pub url: String,
    #[serde(default)]
    pub base_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorSettings {
    pub normal_capacity: usize,
    pub normal_interval_ms: u64,
    pub turbo_capacity: usize,
    pub turbo_interval_ms: u64,
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CanvasSettings {
    pub workflow_path: Option<PathBuf>,
    pub width: f64,
    pub height: f64,
    pub coordinate_poll_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BridgeSettings {
    pub context_path: String,
}

impl PanelsConfig {
    /// Reject values that would leave the service running but useless.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.monitor.normal_capacity == 0 || self.monitor.turbo_capacity == 0 {
            anyhow::bail!("monitor capacities must be at least 1 sample");
        }
        if self.monitor.normal_interval_ms == 0 || self.monitor.turbo_interval_ms == 0 {
            anyhow::bail!("monitor intervals must be at least 1 ms");
        }
        if self.canvas.coordinate_poll_ms == 0 {
            anyhow::bail!("canvas.coordinate_poll_ms must be at least 1 ms");
        }
        Ok(())
    }
}

impl MonitorSettings {
    pub fn profiles(&self) -> ModeProfiles {
        ModeProfiles {
            normal: SamplingProfile::new(self.normal_capacity, self.normal_interval_ms),
            turbo: SamplingProfile::new(self.turbo_capacity, self.turbo_interval_ms),
        }
    }

    /// Configured directory, else the per-user data directory.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("node-panels")
        })
    }
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("host.url", "http://127.0.0.1:8188/")?
        .set_default("host.base_path", "")?
        .set_default("server.listen", "127.0.0.1:8190")?
        .set_default("monitor.normal_capacity", 60)?
        .set_default("monitor.normal_interval_ms", 1000)?
        .set_default("monitor.turbo_capacity", 300)?
        .set_default("monitor.turbo_interval_ms", 200)?
        .set_default("canvas.width", 1280.0)?
        .set_default("canvas.height", 720.0)?
        .set_default("canvas.coordinate_poll_ms", 250)?
        .set_default("bridge.context_path", "profiler/workflow_context")?)
}

/// Defaults, then `config/panels.*` if present, then `PANELS__*` variables.
pub fn load_panels_config() -> anyhow::Result<PanelsConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/panels").required(false))
        .add_source(config::Environment::with_prefix("PANELS").separator("__"))
        .build()?;

    let config: PanelsConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: PanelsConfig = builder().unwrap().build().unwrap().try_deserialize().unwrap();

        assert_eq!(config.host.url, "http://127.0.0.1:8188/");
        assert_eq!(config.server.listen, "127.0.0.1:8190");
        assert_eq!(config.monitor.profiles(), ModeProfiles::default());
        assert!(config.canvas.workflow_path.is_none());
        assert_eq!(config.bridge.context_path, "profiler/workflow_context");
    }

    fn from_toml(text: &str) -> PanelsConfig {
        builder()
            .unwrap()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(from_toml("").validate().is_ok());
        assert!(from_toml("[canvas]\ncoordinate_poll_ms = 0\n").validate().is_err());
        assert!(from_toml("[monitor]\nturbo_capacity = 0\n").validate().is_err());
        assert!(from_toml("[monitor]\nnormal_capacity = 0\n").validate().is_err());
        assert!(from_toml("[monitor]\nnormal_interval_ms = 0\n").validate().is_err());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = from_toml(
            "[monitor]\nturbo_capacity = 600\nstate_dir = \"/tmp/panels\"\n[host]\nbase_path = \"comfy/\"\n",
        );

        assert_eq!(config.monitor.turbo_capacity, 600);
        assert_eq!(config.monitor.state_dir(), PathBuf::from("/tmp/panels"));
        assert_eq!(config.host.base_path, "comfy/");
    }
}
