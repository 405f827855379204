//! Utilization collection from the cloud inventory
//!
//! An `InstanceSource` lists running instances and returns their raw metric
//! series. `collect_samples` reduces those series to one `UtilizationSample`
//! per instance, ready for the estimation engine.

mod inventory;
mod r#loop;


pub use inventory::{Inventory, InventoryInstance, InventorySource, RUNNING_STATE};
pub use r#loop::{CycleReport, MonitorConfig, MonitorLoop, MonitorLoopBuilder};

use crate::models::{Datapoint, InstanceDescriptor, InstanceUtilization, UtilizationSample};
use anyhow::Result;
use tracing::warn;

pub use async_trait::async_trait;

/// Source of instance inventory and utilization
#[async_trait]
pub trait InstanceSource: Send + Sync {
    /// List instances currently in the running state
    async fn list_running(&self) -> Result<Vec<InstanceDescriptor>>;

    /// Fetch the recent metric series for one instance
    async fn utilization(&self, instance: &InstanceDescriptor) -> Result<InstanceUtilization>;

    /// Frozen view used for a whole collection pass
    ///
    /// Sources that re-read external state on every call return a copy so a
    /// pass lists and samples instances from one read. `None` means the
    /// source is already consistent and is used directly.
    async fn snapshot(&self) -> Result<Option<Box<dyn InstanceSource>>> {
        Ok(None)
    }
}

/// Mean of a series, 0 when the series is empty
pub fn mean_value(datapoints: &[Datapoint]) -> f64 {
    if datapoints.is_empty() {
        return 0.0;
    }
    datapoints.iter().map(|d| d.value).sum::<f64>() / datapoints.len() as f64
}

/// Reduce an instance's metric series to a single sample
pub fn build_sample(
    instance: &InstanceDescriptor,
    utilization: &InstanceUtilization,
    timestamp: i64,
) -> UtilizationSample {
    UtilizationSample::new(
        instance.instance_id.clone(),
        instance.instance_class.clone(),
        instance.region(),
        mean_value(&utilization.cpu),
    )
    .with_memory(mean_value(&utilization.memory))
    .with_network(
        mean_value(&utilization.network_in),
        mean_value(&utilization.network_out),
    )
    .with_timestamp(timestamp)
}

/// Sample every running instance
///
/// Listing failures are returned; instances whose metrics cannot be fetched
/// are skipped.
pub async fn collect_samples(source: &dyn InstanceSource) -> Result<Vec<UtilizationSample>> {
    let snapshot = source.snapshot().await?;
    let source: &dyn InstanceSource = match &snapshot {
        Some(frozen) => frozen.as_ref(),
        None => source,
    };

    let instances = source.list_running().await?;
    let timestamp = chrono::Utc::now().timestamp();
    let mut samples = Vec::with_capacity(instances.len());

    for instance in &instances {
        match source.utilization(instance).await {
            Ok(utilization) => samples.push(build_sample(instance, &utilization, timestamp)),
            Err(e) => {
                warn!(
                    instance_id = %instance.instance_id,
                    error = %e,
                    "Failed to get instance metrics"
                );
            }
        }
    }

    Ok(samples)
}
