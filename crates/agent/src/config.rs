//! Agent configuration

use anyhow::{bail, Context, Result};
use energy_agent_lib::estimation::{
    CarbonFactorTable, EstimationEngine, PowerProfile, PowerProfileTable, RenewableShareTable,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Config file read when `AGENT_CONFIG_FILE` is unset (extension optional)
pub const DEFAULT_CONFIG_FILE: &str = "configs/agent";

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Region the agent reports for
    #[serde(default = "default_region")]
    pub region: String,

    /// Inventory document listing instances and their metric series
    #[serde(default = "default_inventory_path")]
    pub inventory_path: PathBuf,

    /// Directory for `energy_metrics.csv` and `workload_data.csv`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_energy_log_path")]
    pub energy_log_path: PathBuf,

    /// Monitoring interval in seconds
    #[serde(default = "default_monitoring_interval")]
    pub monitoring_interval_secs: u64,

    /// Power draw (watts) above which scaling out is recommended
    #[serde(default = "default_energy_threshold")]
    pub energy_threshold: f64,

    /// Power profile overrides by instance class
    #[serde(default)]
    pub power_profiles: HashMap<String, PowerProfile>,

    /// Grid carbon intensity overrides by region (g CO2/kWh)
    #[serde(default)]
    pub carbon_factors: HashMap<String, f64>,

    /// Renewable share overrides by region (percent)
    #[serde(default)]
    pub renewable_shares: HashMap<String, f64>,
}

fn default_api_port() -> u16 {
    8000
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_inventory_path() -> PathBuf {
    PathBuf::from("data/inventory.json")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_energy_log_path() -> PathBuf {
    PathBuf::from("logs/energy_logs.txt")
}

fn default_monitoring_interval() -> u64 {
    300
}

fn default_energy_threshold() -> f64 {
    80.0
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            region: default_region(),
            inventory_path: default_inventory_path(),
            data_dir: default_data_dir(),
            energy_log_path: default_energy_log_path(),
            monitoring_interval_secs: default_monitoring_interval(),
            energy_threshold: default_energy_threshold(),
            power_profiles: HashMap::new(),
            carbon_factors: HashMap::new(),
            renewable_shares: HashMap::new(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from the config file and environment
    pub fn load() -> Result<Self> {
        let file = std::env::var("AGENT_CONFIG_FILE")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&file)
    }

    /// Load configuration from `file` (optional) overlaid by `AGENT_*` variables
    pub fn load_from(file: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("AGENT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load configuration from {}", file))?;

        let config: Self = config
            .try_deserialize()
            .context("Invalid agent configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.monitoring_interval_secs == 0 {
            bail!("monitoring_interval_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn monitoring_interval(&self) -> Duration {
        Duration::from_secs(self.monitoring_interval_secs)
    }

    /// Estimation engine over the built-in tables overlaid with configured entries
    pub fn engine(&self) -> EstimationEngine {
        EstimationEngine::with_tables(
            PowerProfileTable::builtin().with_overrides(self.power_profiles.clone()),
            CarbonFactorTable::builtin().with_overrides(self.carbon_factors.clone()),
        )
        .with_renewable_shares(
            RenewableShareTable::builtin().with_overrides(self.renewable_shares.clone()),
        )
    }
}
