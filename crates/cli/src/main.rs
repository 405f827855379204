//! Energy Agent CLI
//!
//! A command-line tool for estimating instance energy use, querying the
//! agent's latest estimates and requesting energy-aware workload placement.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{allocate, configure, energy, estimate, status};
use energy_agent_lib::WorkloadRequest;

/// Energy Agent CLI
#[derive(Parser)]
#[command(name = "eactl")]
#[command(author, version, about = "CLI for the Energy Agent", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via EACTL_API_URL env var)
    #[arg(long, env = "EACTL_API_URL")]
    pub api_url: Option<String>,

    /// Output format (defaults to the config file's default_format, then table)
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate energy and carbon locally, without contacting the agent
    Estimate {
        /// Instance class (e.g. t3.medium)
        #[arg(long = "class")]
        instance_class: String,

        /// CPU utilization percent
        #[arg(long)]
        cpu: f64,

        /// Memory utilization percent
        #[arg(long, default_value_t = 0.0)]
        memory: f64,

        /// Region used for the carbon factor
        #[arg(long, default_value = "us-east-1")]
        region: String,
    },

    /// Show the latest energy estimates reported by the agent
    Energy {
        /// Instance ID (shows all instances if not specified)
        instance_id: Option<String>,
    },

    /// Show renewable share and carbon intensity of a region
    Sustainability {
        /// Region name (e.g. eu-west-1)
        region: String,
    },

    /// Place a workload on the most energy-efficient instance
    Allocate {
        /// Requested CPU (cores)
        #[arg(long)]
        cpu_request: f64,

        /// Requested memory (e.g. 512Mi)
        #[arg(long)]
        memory_request: String,

        /// Workload priority
        #[arg(long, default_value = "normal")]
        priority: String,

        /// Skip instances drawing more than this many watts
        #[arg(long)]
        max_energy: Option<f64>,
    },

    /// Show agent health and readiness
    Status,

    /// Manage CLI settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show stored settings
    Show,

    /// Store default settings
    Set {
        /// Default agent URL
        #[arg(long)]
        api_url: Option<String>,

        /// Default output format (table or json)
        #[arg(long)]
        default_format: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = config::Config::load()?;
    let format = cli
        .format
        .or_else(|| {
            settings
                .default_format
                .as_deref()
                .and_then(output::OutputFormat::from_name)
        })
        .unwrap_or_default();

    let api_url = settings.resolve_api_url(cli.api_url);
    let connect = || client::ApiClient::new(&api_url);

    match cli.command {
        Commands::Estimate {
            instance_class,
            cpu,
            memory,
            region,
        } => {
            estimate::estimate(&instance_class, cpu, memory, &region, format)?;
        }
        Commands::Energy { instance_id } => {
            energy::show_energy(&connect()?, instance_id, format).await?;
        }
        Commands::Sustainability { region } => {
            energy::show_sustainability(&connect()?, &region, format).await?;
        }
        Commands::Allocate {
            cpu_request,
            memory_request,
            priority,
            max_energy,
        } => {
            let request = WorkloadRequest {
                cpu_request,
                memory_request,
                priority,
                max_energy_consumption: max_energy,
            };
            allocate::allocate(&connect()?, request, format).await?;
        }
        Commands::Status => {
            status::show_status(&connect()?, format).await?;
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show => configure::show(&settings, format)?,
            ConfigCommands::Set {
                api_url,
                default_format,
            } => configure::set(settings, api_url, default_format)?,
        },
    }

    Ok(())
}
