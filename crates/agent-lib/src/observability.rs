//! Observability infrastructure for the energy agent
//!
//! Provides:
//! - A `MetricsSink` trait handed to every layer that reports values
//! - `AgentMetrics`, the Prometheus implementation backed by its own registry
//! - Structured JSON logging with tracing

use crate::models::{AllocationDecision, EstimationResult, RegionSustainability};
use anyhow::Result;
use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Default histogram buckets for collection latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Buckets for allocation latency (in seconds)
const ALLOCATION_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.0, 5.0];

const NAMESPACE: &str = "energy_agent";

/// Destination for the values the agent reports
///
/// Injected into the monitor loop, the allocator and the health registry.
pub trait MetricsSink: Send + Sync {
    /// Publish the energy/carbon figures of one instance
    fn record_estimate(&self, result: &EstimationResult);

    /// Number of instances seen in the last collection cycle
    fn set_instances_monitored(&self, count: i64);

    fn observe_collection_latency(&self, duration_secs: f64);

    fn observe_allocation_latency(&self, duration_secs: f64);

    /// Count an allocation attempt, `status` is `success` or `error`
    fn record_allocation(&self, priority: &str, status: &str);

    fn record_error(&self, error_type: &str, component: &str);

    /// 0 = down, 1 = degraded, 2 = healthy
    fn set_component_status(&self, component: &str, value: i64);

    fn record_sustainability(&self, sustainability: &RegionSustainability);
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_estimate(&self, _result: &EstimationResult) {}
    fn set_instances_monitored(&self, _count: i64) {}
    fn observe_collection_latency(&self, _duration_secs: f64) {}
    fn observe_allocation_latency(&self, _duration_secs: f64) {}
    fn record_allocation(&self, _priority: &str, _status: &str) {}
    fn record_error(&self, _error_type: &str, _component: &str) {}
    fn set_component_status(&self, _component: &str, _value: i64) {}
    fn record_sustainability(&self, _sustainability: &RegionSustainability) {}
}

struct AgentMetricsInner {
    registry: Registry,
    energy_consumption_watts: GaugeVec,
    carbon_footprint_kg: GaugeVec,
    cpu_utilization_percent: GaugeVec,
    memory_utilization_percent: GaugeVec,
    instances_monitored: IntGauge,
    collection_latency_seconds: Histogram,
    allocation_latency_seconds: Histogram,
    workload_allocations: IntCounterVec,
    errors: IntCounterVec,
    component_status: GaugeVec,
    green_energy_ratio: GaugeVec,
}

impl AgentMetricsInner {
    fn new(registry: Registry) -> Result<Self> {
        let inner = Self {
            energy_consumption_watts: GaugeVec::new(
                Opts::new("energy_consumption_watts", "Estimated power draw per instance")
                    .namespace(NAMESPACE),
                &["instance_id", "instance_class"],
            )?,
            carbon_footprint_kg: GaugeVec::new(
                Opts::new("carbon_footprint_kg", "Estimated carbon footprint per instance")
                    .namespace(NAMESPACE),
                &["instance_id", "region"],
            )?,
            cpu_utilization_percent: GaugeVec::new(
                Opts::new("cpu_utilization_percent", "CPU utilization percentage")
                    .namespace(NAMESPACE),
                &["instance_id"],
            )?,
            memory_utilization_percent: GaugeVec::new(
                Opts::new("memory_utilization_percent", "Memory utilization percentage")
                    .namespace(NAMESPACE),
                &["instance_id"],
            )?,
            instances_monitored: IntGauge::with_opts(
                Opts::new(
                    "instances_monitored",
                    "Number of running instances in the last collection cycle",
                )
                .namespace(NAMESPACE),
            )?,
            collection_latency_seconds: Histogram::with_opts(
                HistogramOpts::new(
                    "collection_latency_seconds",
                    "Time spent collecting and estimating one cycle",
                )
                .namespace(NAMESPACE)
                .buckets(LATENCY_BUCKETS.to_vec()),
            )?,
            allocation_latency_seconds: Histogram::with_opts(
                HistogramOpts::new(
                    "allocation_latency_seconds",
                    "Time spent allocating workloads",
                )
                .namespace(NAMESPACE)
                .buckets(ALLOCATION_BUCKETS.to_vec()),
            )?,
            workload_allocations: IntCounterVec::new(
                Opts::new("workload_allocations_total", "Total number of workload allocations")
                    .namespace(NAMESPACE),
                &["priority", "status"],
            )?,
            errors: IntCounterVec::new(
                Opts::new("errors_total", "Total number of errors").namespace(NAMESPACE),
                &["error_type", "component"],
            )?,
            component_status: GaugeVec::new(
                Opts::new(
                    "component_status",
                    "Component status (0=down, 1=degraded, 2=healthy)",
                )
                .namespace(NAMESPACE),
                &["component"],
            )?,
            green_energy_ratio: GaugeVec::new(
                Opts::new("green_energy_ratio", "Ratio of green energy usage (0-1)")
                    .namespace(NAMESPACE),
                &["region"],
            )?,
            registry,
        };

        inner.registry.register(Box::new(inner.energy_consumption_watts.clone()))?;
        inner.registry.register(Box::new(inner.carbon_footprint_kg.clone()))?;
        inner.registry.register(Box::new(inner.cpu_utilization_percent.clone()))?;
        inner.registry.register(Box::new(inner.memory_utilization_percent.clone()))?;
        inner.registry.register(Box::new(inner.instances_monitored.clone()))?;
        inner.registry.register(Box::new(inner.collection_latency_seconds.clone()))?;
        inner.registry.register(Box::new(inner.allocation_latency_seconds.clone()))?;
        inner.registry.register(Box::new(inner.workload_allocations.clone()))?;
        inner.registry.register(Box::new(inner.errors.clone()))?;
        inner.registry.register(Box::new(inner.component_status.clone()))?;
        inner.registry.register(Box::new(inner.green_energy_ratio.clone()))?;

        Ok(inner)
    }
}

/// Prometheus-backed metrics sink
///
/// Owns its registry, so independent instances never collide. Clones share
/// the same underlying metrics.
#[derive(Clone)]
pub struct AgentMetrics {
    inner: Arc<AgentMetricsInner>,
}

impl AgentMetrics {
    /// Create metrics registered into a fresh registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Create metrics registered into the given registry
    pub fn with_registry(registry: Registry) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(AgentMetricsInner::new(registry)?),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn encode(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

impl MetricsSink for AgentMetrics {
    fn record_estimate(&self, result: &EstimationResult) {
        let inner = &self.inner;
        inner
            .energy_consumption_watts
            .with_label_values(&[&result.instance_id, &result.instance_class])
            .set(result.energy_consumption_watts);
        inner
            .carbon_footprint_kg
            .with_label_values(&[&result.instance_id, &result.region])
            .set(result.carbon_footprint_kg);
        inner
            .cpu_utilization_percent
            .with_label_values(&[&result.instance_id])
            .set(result.cpu_utilization);
        inner
            .memory_utilization_percent
            .with_label_values(&[&result.instance_id])
            .set(result.memory_utilization);
    }

    fn set_instances_monitored(&self, count: i64) {
        self.inner.instances_monitored.set(count);
    }

    fn observe_collection_latency(&self, duration_secs: f64) {
        self.inner.collection_latency_seconds.observe(duration_secs);
    }

    fn observe_allocation_latency(&self, duration_secs: f64) {
        self.inner.allocation_latency_seconds.observe(duration_secs);
    }

    fn record_allocation(&self, priority: &str, status: &str) {
        self.inner
            .workload_allocations
            .with_label_values(&[priority, status])
            .inc();
    }

    fn record_error(&self, error_type: &str, component: &str) {
        self.inner
            .errors
            .with_label_values(&[error_type, component])
            .inc();
    }

    fn set_component_status(&self, component: &str, value: i64) {
        self.inner
            .component_status
            .with_label_values(&[component])
            .set(value as f64);
    }

    fn record_sustainability(&self, sustainability: &RegionSustainability) {
        self.inner
            .green_energy_ratio
            .with_label_values(&[&sustainability.region])
            .set(sustainability.renewable_percentage / 100.0);
    }
}

/// Structured logger for agent events
///
/// Provides consistent JSON-formatted logging for estimates, allocations
/// and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    region: String,
}

impl StructuredLogger {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    /// Log agent startup
    pub fn log_startup(&self, version: &str, instances_configured: usize) {
        info!(
            event = "agent_started",
            region = %self.region,
            agent_version = %version,
            power_profiles = instances_configured,
            "Energy agent started"
        );
    }

    /// Log agent shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            region = %self.region,
            reason = %reason,
            "Energy agent shutting down"
        );
    }

    pub fn log_estimate(&self, result: &EstimationResult) {
        info!(
            event = "estimate_recorded",
            instance_id = %result.instance_id,
            instance_class = %result.instance_class,
            instance_region = %result.region,
            cpu_utilization = result.cpu_utilization,
            energy_consumption_watts = result.energy_consumption_watts,
            carbon_footprint_kg = result.carbon_footprint_kg,
            "Recorded energy estimate"
        );
    }

    /// Log a collection cycle summary
    pub fn log_cycle(&self, instances: usize, errors: usize, elapsed_ms: u128) {
        info!(
            event = "collection_cycle",
            region = %self.region,
            instances = instances,
            errors = errors,
            elapsed_ms = elapsed_ms,
            "Collected metrics for {} instances",
            instances
        );
    }

    pub fn log_allocation(&self, decision: &AllocationDecision, priority: &str) {
        info!(
            event = "workload_allocated",
            region = %self.region,
            allocated_instance = %decision.allocated_instance,
            energy_consumption = decision.energy_consumption,
            priority = %priority,
            "Allocating workload to instance {}",
            decision.allocated_instance
        );
    }

    pub fn log_allocation_failure(&self, priority: &str, reason: &str) {
        warn!(
            event = "allocation_failed",
            region = %self.region,
            priority = %priority,
            reason = %reason,
            "Failed to allocate workload"
        );
    }

    pub fn log_scale_out(&self, energy_consumption: f64, threshold: f64) {
        info!(
            event = "scale_out_recommended",
            region = %self.region,
            energy_consumption = energy_consumption,
            threshold = threshold,
            "High energy consumption detected, initiating scale out"
        );
    }
}
