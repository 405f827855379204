//! Energy Agent - energy and carbon estimation agent
//!
//! Samples running instances on a fixed interval, estimates their power draw
//! and carbon footprint, and serves estimates and energy-aware workload
//! placement over HTTP.

use anyhow::Result;
use energy_agent::{api, config::AgentConfig};
use energy_agent_lib::{
    allocator::WorkloadAllocator,
    collector::{InstanceSource, InventorySource, MonitorLoopBuilder},
    health::{components, HealthRegistry},
    observability::{AgentMetrics, MetricsSink, StructuredLogger},
    recorder::DataRecorder,
    store::EstimateStore,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting energy-agent");

    let config = AgentConfig::load()?;
    info!(
        region = %config.region,
        inventory = %config.inventory_path.display(),
        "Agent configured"
    );

    let metrics = AgentMetrics::new()?;
    let sink: Arc<dyn MetricsSink> = Arc::new(metrics.clone());

    let health_registry = HealthRegistry::with_metrics(sink.clone());
    health_registry.register(components::COLLECTOR).await;
    health_registry.register(components::ALLOCATOR).await;
    health_registry.register(components::RECORDER).await;
    health_registry.register(components::API).await;

    let engine = Arc::new(config.engine());
    let store = Arc::new(EstimateStore::new());
    let source: Arc<dyn InstanceSource> =
        Arc::new(InventorySource::from_path(config.inventory_path.clone()));

    let logger = StructuredLogger::new(&config.region);
    logger.log_startup(AGENT_VERSION, engine.power_profiles().len());

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let (monitor, mut results_rx) = MonitorLoopBuilder::new()
        .source(source.clone())
        .engine(engine.clone())
        .metrics(sink.clone())
        .store(store.clone())
        .recorder(DataRecorder::new(
            config.data_dir.clone(),
            config.energy_log_path.clone(),
        ))
        .health(health_registry.clone())
        .logger(logger.clone())
        .interval(config.monitoring_interval())
        .build()?;

    let allocator = Arc::new(
        WorkloadAllocator::new(source, engine.clone(), sink, logger.clone())
            .with_health(health_registry.clone())
            .with_energy_threshold(config.energy_threshold),
    );

    let monitor_handle = tokio::spawn(monitor.run(shutdown_tx.subscribe()));

    // Scale-out check on every collected batch
    let scale_allocator = allocator.clone();
    let scale_handle = tokio::spawn(async move {
        while let Some(batch) = results_rx.recv().await {
            for result in &batch {
                scale_allocator.scale_action(result.energy_consumption_watts);
            }
        }
    });

    let app_state = Arc::new(api::AppState {
        health_registry: health_registry.clone(),
        metrics,
        engine,
        store,
        allocator,
        logger: logger.clone(),
    });

    // Mark agent as ready after initialization
    health_registry.set_ready(true).await;

    let api_registry = health_registry.clone();
    let api_port = config.api_port;
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, app_state).await {
            error!(error = %e, "API server failed");
            api_registry
                .set_unhealthy(components::API, e.to_string())
                .await;
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    let _ = shutdown_tx.send(());
    if let Err(e) = monitor_handle.await {
        error!(error = %e, "Monitor loop task failed");
    }
    scale_handle.abort();
    api_handle.abort();

    info!("Shutdown complete");
    Ok(())
}
