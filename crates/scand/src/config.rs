//! Daemon configuration

use anyhow::{Context, Result};
use scan_engine::{InterfaceInfo, ScanCapabilities, SchedulePolicy, WiphyFeatures};
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming an optional config file
pub const CONFIG_PATH_ENV: &str = "SCAND_CONFIG";

/// Daemon configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Host name reported in startup logs
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// Port for the scan, health and metrics API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Background scan schedule tunables
    #[serde(default)]
    pub schedule: SchedulePolicy,

    /// Radios to manage; a simulated `wlan0` is used when empty
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,
}

/// One managed radio
#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceConfig {
    pub name: String,
    pub index: u32,
    #[serde(default)]
    pub capabilities: ScanCapabilities,
    #[serde(default)]
    pub features: WiphyFeatures,
    #[serde(default)]
    pub offload_supported: bool,
}

impl InterfaceConfig {
    pub fn info(&self) -> InterfaceInfo {
        InterfaceInfo::new(&self.name, self.index)
    }
}

fn default_node_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

/// Simulated radio served when no interfaces are configured
pub fn default_interface() -> InterfaceConfig {
    InterfaceConfig {
        name: "wlan0".to_string(),
        index: 12,
        capabilities: ScanCapabilities {
            max_scan_ssids: 4,
            max_sched_scan_ssids: 16,
            max_match_sets: 16,
            max_scan_plans: 2,
            max_scan_plan_interval_sec: 3600,
            max_scan_plan_iterations: 100,
        },
        features: WiphyFeatures {
            supports_low_span_scan: true,
            supports_low_power_scan: true,
            supports_high_accuracy_scan: false,
            supports_random_mac_oneshot_scan: true,
            supports_random_mac_sched_scan: true,
        },
        offload_supported: true,
    }
}

impl DaemonConfig {
    /// Load configuration from the optional `SCAND_CONFIG` file and `SCAND_*` environment
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(path.as_deref().map(Path::new))
    }

    /// Load configuration from an optional file, with environment overrides
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("SCAND")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read scand configuration")?;

        config
            .try_deserialize()
            .context("Invalid scand configuration")
    }

    /// Configured interfaces, or the simulated default
    pub fn effective_interfaces(&self) -> Vec<InterfaceConfig> {
        if self.interfaces.is_empty() {
            vec![default_interface()]
        } else {
            self.interfaces.clone()
        }
    }
}
