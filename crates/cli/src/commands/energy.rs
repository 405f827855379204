//! Energy and sustainability queries against the agent

use anyhow::Result;
use colored::Colorize;
use energy_agent_lib::{EstimationResult, RegionSustainability};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_renewable, format_carbon, format_percent, format_timestamp, format_watts, print_json,
    print_table, OutputFormat,
};

/// Row for the energy table
#[derive(Tabled)]
struct EnergyRow {
    #[tabled(rename = "Instance")]
    instance_id: String,
    #[tabled(rename = "Class")]
    instance_class: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Energy")]
    energy: String,
    #[tabled(rename = "Carbon")]
    carbon: String,
    #[tabled(rename = "Sampled")]
    sampled: String,
}

impl From<&EstimationResult> for EnergyRow {
    fn from(r: &EstimationResult) -> Self {
        Self {
            instance_id: r.instance_id.clone(),
            instance_class: r.instance_class.clone(),
            region: r.region.clone(),
            cpu: format_percent(r.cpu_utilization),
            energy: format_watts(r.energy_consumption_watts),
            carbon: format_carbon(r.carbon_footprint_kg),
            sampled: format_timestamp(r.timestamp),
        }
    }
}

/// Show the latest estimate of one instance, or of all instances
pub async fn show_energy(
    client: &ApiClient,
    instance_id: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let results: Vec<EstimationResult> = match &instance_id {
        Some(id) => vec![client.get_item("api/v1/energy", id).await?],
        None => client.get("api/v1/energy").await?,
    };

    match format {
        OutputFormat::Json => match instance_id {
            Some(_) => print_json(&results[0])?,
            None => print_json(&results)?,
        },
        OutputFormat::Table => {
            let rows: Vec<EnergyRow> = results.iter().map(EnergyRow::from).collect();
            print_table(&rows);

            if results.len() > 1 {
                let total: f64 = results.iter().map(|r| r.energy_consumption_watts).sum();
                let carbon: f64 = results.iter().map(|r| r.carbon_footprint_kg).sum();
                println!(
                    "{} {} / {}",
                    "Fleet total:".bold(),
                    format_watts(total),
                    format_carbon(carbon)
                );
            }
        }
    }

    Ok(())
}

/// Show renewable share and grid intensity of a region
pub async fn show_sustainability(
    client: &ApiClient,
    region: &str,
    format: OutputFormat,
) -> Result<()> {
    let report: RegionSustainability = client.get_item("api/v1/sustainability", region).await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            println!("{}", "Region Sustainability".bold());
            println!("{}", "=".repeat(50));
            println!("Region:                 {}", report.region.cyan());
            println!(
                "Renewable share:        {}",
                color_renewable(report.renewable_percentage)
            );
            println!(
                "Carbon intensity:       {:.0} gCO2/kWh",
                report.carbon_intensity
            );
        }
    }

    Ok(())
}
