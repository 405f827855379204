//! Workload allocation

use anyhow::Result;
use energy_agent_lib::{AllocationDecision, WorkloadRequest};

use crate::client::ApiClient;
use crate::output::{format_watts, print_info, print_json, print_success, OutputFormat};

/// Ask the agent to place a workload on the most energy-efficient instance
pub async fn allocate(
    client: &ApiClient,
    request: WorkloadRequest,
    format: OutputFormat,
) -> Result<()> {
    let decision: AllocationDecision = client.post("api/v1/workloads/allocate", &request).await?;

    match format {
        OutputFormat::Json => print_json(&decision)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Workload allocated to {}",
                decision.allocated_instance
            ));
            print_info(&format!(
                "Estimated draw of target instance: {}",
                format_watts(decision.energy_consumption)
            ));
        }
    }

    Ok(())
}
