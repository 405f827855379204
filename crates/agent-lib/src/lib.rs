//! Agent library for energy and carbon estimation
//!
//! This crate provides the core functionality for:
//! - Energy and carbon estimation from instance utilization
//! - Utilization collection and the periodic monitor loop
//! - Energy-aware workload allocation
//! - Flat-file recording of collection cycles
//! - Health checks and observability

pub mod allocator;
pub mod collector;
pub mod estimation;
pub mod health;
pub mod models;
pub mod observability;
pub mod recorder;
pub mod store;

pub use allocator::{AllocationError, ScaleAction, WorkloadAllocator};
pub use estimation::{EstimationEngine, NoCandidatesError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AgentMetrics, MetricsSink, NoopMetrics, StructuredLogger};
pub use store::EstimateStore;
