//! Local estimation, no agent required

use anyhow::Result;
use colored::Colorize;
use energy_agent_lib::{EstimationEngine, UtilizationSample};

use crate::output::{format_carbon, format_percent, format_watts, print_json, OutputFormat};

/// Estimate energy and carbon for a hypothetical instance
pub fn estimate(
    instance_class: &str,
    cpu: f64,
    memory: f64,
    region: &str,
    format: OutputFormat,
) -> Result<()> {
    let engine = EstimationEngine::new();
    let sample = UtilizationSample::new("local", instance_class, region, cpu).with_memory(memory);
    let result = engine.estimate(&sample);

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Energy Estimate".bold());
            println!("{}", "=".repeat(50));
            println!("Instance class:         {}", result.instance_class.cyan());
            println!("Region:                 {}", result.region.cyan());
            println!("CPU utilization:        {}", format_percent(result.cpu_utilization));
            println!("Memory utilization:     {}", format_percent(result.memory_utilization));
            println!();
            println!(
                "{} {}",
                "Energy consumption:".bold(),
                format_watts(result.energy_consumption_watts).green()
            );
            println!(
                "{}  {}",
                "Carbon footprint:".bold(),
                format_carbon(result.carbon_footprint_kg).green()
            );

            if engine.power_profiles().get(instance_class).is_none() {
                println!();
                println!(
                    "{}",
                    format!("Unknown instance class {}, using fallback profile", instance_class)
                        .dimmed()
                );
            }
        }
    }

    Ok(())
}
