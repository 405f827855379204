//! Flat-file recording of collection cycles
//!
//! Each cycle appends:
//! - one JSON line `{ "timestamp", "data" }` to the energy log
//! - one row per instance to `energy_metrics.csv`
//! - one row per instance to `workload_data.csv`, consumed by offline
//!   demand forecasting
//!
//! CSV headers are written only when a file is created.

use crate::models::{EstimationResult, UtilizationSample};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENERGY_METRICS_FILE: &str = "energy_metrics.csv";
pub const WORKLOAD_DATA_FILE: &str = "workload_data.csv";

/// CPU percent represented by one unit of workload demand
const CPU_PER_DEMAND_UNIT: f64 = 20.0;

/// Demand label written to `workload_data.csv`: `max(1, floor(cpu / 20))`
pub fn workload_demand(cpu_utilization: f64) -> u32 {
    let units = (cpu_utilization / CPU_PER_DEMAND_UNIT).floor();
    if units.is_nan() || units < 1.0 {
        1
    } else {
        units as u32
    }
}

#[derive(Debug, Serialize)]
struct EnergyLogLine<'a> {
    timestamp: String,
    data: &'a [EstimationResult],
}

#[derive(Debug, Serialize)]
struct EnergyMetricsRow<'a> {
    timestamp: &'a str,
    instance_id: &'a str,
    instance_type: &'a str,
    region: &'a str,
    energy_consumption: f64,
    carbon_footprint: f64,
    cpu_utilization: f64,
    memory_usage: f64,
}

#[derive(Debug, Serialize)]
struct WorkloadRow<'a> {
    timestamp: &'a str,
    cpu_utilization: f64,
    memory_usage: f64,
    network_in: f64,
    network_out: f64,
    workload_demand: u32,
}

/// Appends cycle data to the energy log and CSV files
#[derive(Debug, Clone)]
pub struct DataRecorder {
    data_dir: PathBuf,
    energy_log_path: PathBuf,
}

impl DataRecorder {
    pub fn new(data_dir: impl Into<PathBuf>, energy_log_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            energy_log_path: energy_log_path.into(),
        }
    }

    pub fn energy_metrics_path(&self) -> PathBuf {
        self.data_dir.join(ENERGY_METRICS_FILE)
    }

    pub fn workload_data_path(&self) -> PathBuf {
        self.data_dir.join(WORKLOAD_DATA_FILE)
    }

    pub fn energy_log_path(&self) -> &Path {
        &self.energy_log_path
    }

    /// Record one collection cycle; nothing is written for an empty cycle
    pub fn record_cycle(
        &self,
        at: DateTime<Utc>,
        samples: &[UtilizationSample],
        results: &[EstimationResult],
    ) -> Result<()> {
        if results.is_empty() {
            return Ok(());
        }
        let timestamp = at.to_rfc3339_opts(SecondsFormat::Secs, true);

        self.append_energy_log(&timestamp, results)?;
        self.append_energy_metrics(&timestamp, results)?;
        self.append_workload_data(&timestamp, samples)?;

        debug!(
            instances = results.len(),
            data_dir = %self.data_dir.display(),
            "Recorded collection cycle"
        );
        Ok(())
    }

    fn append_energy_log(&self, timestamp: &str, results: &[EstimationResult]) -> Result<()> {
        let line = serde_json::to_string(&EnergyLogLine {
            timestamp: timestamp.to_string(),
            data: results,
        })?;

        let mut file = open_append(&self.energy_log_path)?;
        writeln!(file, "{}", line).context("Failed to write energy log")?;
        Ok(())
    }

    fn append_energy_metrics(&self, timestamp: &str, results: &[EstimationResult]) -> Result<()> {
        let mut writer = csv_appender(&self.energy_metrics_path())?;
        for r in results {
            writer.serialize(EnergyMetricsRow {
                timestamp,
                instance_id: &r.instance_id,
                instance_type: &r.instance_class,
                region: &r.region,
                energy_consumption: r.energy_consumption_watts,
                carbon_footprint: r.carbon_footprint_kg,
                cpu_utilization: r.cpu_utilization,
                memory_usage: r.memory_utilization,
            })?;
        }
        writer.flush().context("Failed to flush energy metrics")?;
        Ok(())
    }

    fn append_workload_data(&self, timestamp: &str, samples: &[UtilizationSample]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }
        let mut writer = csv_appender(&self.workload_data_path())?;
        for s in samples {
            writer.serialize(WorkloadRow {
                timestamp,
                cpu_utilization: s.cpu_utilization,
                memory_usage: s.memory_utilization,
                network_in: s.network_in_bytes,
                network_out: s.network_out_bytes,
                workload_demand: workload_demand(s.cpu_utilization),
            })?;
        }
        writer.flush().context("Failed to flush workload data")?;
        Ok(())
    }
}

fn open_append(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))
}

fn csv_appender(path: &Path) -> Result<csv::Writer<fs::File>> {
    let file = open_append(path)?;
    let is_empty = file
        .metadata()
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len()
        == 0;
    Ok(csv::WriterBuilder::new()
        .has_headers(is_empty)
        .from_writer(file))
}
