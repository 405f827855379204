//! Energy-aware workload placement
//!
//! Samples the running fleet, estimates each instance and places the
//! workload on the one drawing the least power.

use crate::collector::{collect_samples, InstanceSource};
use crate::estimation::{EstimationEngine, NoCandidatesError};
use crate::health::{components, HealthRegistry};
use crate::models::{AllocationDecision, EstimationResult, WorkloadRequest};
use crate::observability::{MetricsSink, StructuredLogger};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Default power figure above which scaling out is recommended (watts)
pub const DEFAULT_ENERGY_THRESHOLD: f64 = 80.0;

pub const SUCCESS_STATUS: &str = "success";
pub const ERROR_STATUS: &str = "error";

/// Errors that can occur while placing a workload
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error(transparent)]
    NoCandidates(#[from] NoCandidatesError),

    #[error("instance source error: {0}")]
    Source(#[from] anyhow::Error),
}

/// Scaling recommendation derived from an energy figure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleAction {
    ScaleOut,
    Hold,
}

/// Pick the lowest-energy result within the request's energy ceiling
pub fn allocate_from_results(
    engine: &EstimationEngine,
    request: &WorkloadRequest,
    results: &[EstimationResult],
) -> Result<AllocationDecision, NoCandidatesError> {
    let eligible: Vec<EstimationResult> = match request.max_energy_consumption {
        Some(ceiling) => results
            .iter()
            .filter(|r| r.energy_consumption_watts <= ceiling)
            .cloned()
            .collect(),
        None => results.to_vec(),
    };

    let best = engine.select_best(&eligible)?;
    Ok(AllocationDecision {
        status: SUCCESS_STATUS.to_string(),
        allocated_instance: best.instance_id.clone(),
        energy_consumption: best.energy_consumption_watts,
    })
}

pub struct WorkloadAllocator {
    source: Arc<dyn InstanceSource>,
    engine: Arc<EstimationEngine>,
    metrics: Arc<dyn MetricsSink>,
    health: HealthRegistry,
    logger: StructuredLogger,
    energy_threshold: f64,
}

impl WorkloadAllocator {
    pub fn new(
        source: Arc<dyn InstanceSource>,
        engine: Arc<EstimationEngine>,
        metrics: Arc<dyn MetricsSink>,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            source,
            engine,
            metrics,
            health: HealthRegistry::new(),
            logger,
            energy_threshold: DEFAULT_ENERGY_THRESHOLD,
        }
    }

    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = health;
        self
    }

    pub fn with_energy_threshold(mut self, threshold: f64) -> Self {
        self.energy_threshold = threshold;
        self
    }

    pub fn energy_threshold(&self) -> f64 {
        self.energy_threshold
    }

    /// Place a workload on the most energy-efficient running instance
    pub async fn allocate(
        &self,
        request: &WorkloadRequest,
    ) -> Result<AllocationDecision, AllocationError> {
        let start = Instant::now();
        let outcome = self.try_allocate(request).await;
        self.metrics
            .observe_allocation_latency(start.elapsed().as_secs_f64());

        match &outcome {
            Ok(decision) => {
                self.metrics.record_allocation(&request.priority, SUCCESS_STATUS);
                self.logger.log_allocation(decision, &request.priority);
                self.health.set_healthy(components::ALLOCATOR).await;
            }
            Err(e) => {
                self.metrics.record_allocation(&request.priority, ERROR_STATUS);
                self.metrics.record_error("allocation", components::ALLOCATOR);
                self.logger
                    .log_allocation_failure(&request.priority, &e.to_string());
                if let AllocationError::Source(source_err) = e {
                    self.health
                        .set_degraded(components::ALLOCATOR, source_err.to_string())
                        .await;
                }
            }
        }

        outcome
    }

    async fn try_allocate(
        &self,
        request: &WorkloadRequest,
    ) -> Result<AllocationDecision, AllocationError> {
        let samples = collect_samples(self.source.as_ref()).await?;
        let results = self.engine.estimate_all(&samples);
        Ok(allocate_from_results(&self.engine, request, &results)?)
    }

    /// Recommend scaling out when `energy_consumption` exceeds the threshold
    pub fn scale_action(&self, energy_consumption: f64) -> ScaleAction {
        if energy_consumption > self.energy_threshold {
            self.logger
                .log_scale_out(energy_consumption, self.energy_threshold);
            ScaleAction::ScaleOut
        } else {
            ScaleAction::Hold
        }
    }
}
