//! Core data models for the energy agent

use serde::{Deserialize, Serialize};

/// Per-instance utilization captured by a collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSample {
    pub instance_id: String,
    pub instance_class: String,
    pub region: String,
    /// CPU utilization percent (0 when the source had no data)
    pub cpu_utilization: f64,
    /// Memory utilization percent
    #[serde(default)]
    pub memory_utilization: f64,
    #[serde(default)]
    pub network_in_bytes: f64,
    #[serde(default)]
    pub network_out_bytes: f64,
    /// Unix timestamp (seconds), display only
    #[serde(default = "now_timestamp")]
    pub timestamp: i64,
}

impl UtilizationSample {
    pub fn new(
        instance_id: impl Into<String>,
        instance_class: impl Into<String>,
        region: impl Into<String>,
        cpu_utilization: f64,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            instance_class: instance_class.into(),
            region: region.into(),
            cpu_utilization,
            memory_utilization: 0.0,
            network_in_bytes: 0.0,
            network_out_bytes: 0.0,
            timestamp: now_timestamp(),
        }
    }

    pub fn with_memory(mut self, memory_utilization: f64) -> Self {
        self.memory_utilization = memory_utilization;
        self
    }

    pub fn with_network(mut self, network_in_bytes: f64, network_out_bytes: f64) -> Self {
        self.network_in_bytes = network_in_bytes;
        self.network_out_bytes = network_out_bytes;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Energy and carbon figures derived from one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub instance_id: String,
    pub instance_class: String,
    pub region: String,
    pub energy_consumption_watts: f64,
    pub carbon_footprint_kg: f64,
    pub cpu_utilization: f64,
    pub memory_utilization: f64,
    pub timestamp: i64,
}

/// A running instance as reported by the cloud inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDescriptor {
    pub instance_id: String,
    pub instance_class: String,
    pub availability_zone: String,
}

impl InstanceDescriptor {
    /// Region of the instance, i.e. the availability zone without its zone letter
    pub fn region(&self) -> &str {
        region_from_availability_zone(&self.availability_zone)
    }
}

/// Strip the trailing zone letter from an availability zone (`us-east-1a` -> `us-east-1`)
pub fn region_from_availability_zone(zone: &str) -> &str {
    match zone.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => &zone[..idx],
        _ => zone,
    }
}

/// Single averaged datapoint of a metric series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    pub timestamp: i64,
    pub value: f64,
}

/// Raw metric series fetched for one instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceUtilization {
    #[serde(default)]
    pub cpu: Vec<Datapoint>,
    #[serde(default)]
    pub memory: Vec<Datapoint>,
    #[serde(default)]
    pub network_in: Vec<Datapoint>,
    #[serde(default)]
    pub network_out: Vec<Datapoint>,
}

/// Request to place a new workload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadRequest {
    pub cpu_request: f64,
    pub memory_request: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_energy_consumption: Option<f64>,
}

fn default_priority() -> String {
    "normal".to_string()
}

/// Outcome of a successful allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationDecision {
    pub status: String,
    pub allocated_instance: String,
    pub energy_consumption: f64,
}

/// Renewable share and carbon intensity of a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSustainability {
    pub region: String,
    pub renewable_percentage: f64,
    pub carbon_intensity: f64,
}

fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
