//! Energy monitoring loop
//!
//! Periodically samples every running instance, estimates energy and carbon,
//! and fans the results out to the metrics sink, the estimate store, the
//! flat-file recorder and a channel for downstream consumers.

use super::{collect_samples, InstanceSource};
use crate::estimation::EstimationEngine;
use crate::health::{components, HealthRegistry};
use crate::models::EstimationResult;
use crate::observability::{MetricsSink, StructuredLogger};
use crate::recorder::DataRecorder;
use crate::store::EstimateStore;
use anyhow::{bail, Result};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Configuration for the monitoring loop
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Base collection interval (default: 300 seconds)
    pub interval: Duration,
    /// Maximum jitter added to the interval (default: 1 second)
    pub jitter: Duration,
    /// Interval used while cycles are slow (default: 600 seconds)
    pub degraded_interval: Duration,
    /// Cycles slower than this switch to the degraded interval
    pub slow_cycle_threshold: Duration,
    /// Channel buffer size for result batches
    pub buffer_size: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            jitter: Duration::from_secs(1),
            degraded_interval: Duration::from_secs(600),
            slow_cycle_threshold: Duration::from_secs(30),
            buffer_size: 16,
        }
    }
}

/// Outcome of one collection cycle
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub instances: usize,
    pub record_errors: usize,
    pub elapsed: Duration,
}

pub struct MonitorLoop {
    source: Arc<dyn InstanceSource>,
    engine: Arc<EstimationEngine>,
    metrics: Arc<dyn MetricsSink>,
    store: Arc<EstimateStore>,
    recorder: Option<DataRecorder>,
    health: HealthRegistry,
    logger: StructuredLogger,
    config: MonitorConfig,
    results_tx: mpsc::Sender<Vec<EstimationResult>>,
    degraded_mode: bool,
}

impl MonitorLoop {
    /// Start the loop; returns when `shutdown` fires
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            "Starting energy monitoring loop"
        );

        let mut ticker = interval(self.current_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let elapsed = match self.run_cycle().await {
                        Ok(report) => report.elapsed,
                        Err(e) => {
                            warn!(error = %e, "Collection cycle failed");
                            continue;
                        }
                    };

                    let was_degraded = self.degraded_mode;
                    self.check_cycle_duration(elapsed);
                    if was_degraded != self.degraded_mode {
                        ticker = interval(self.current_interval());
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        // first tick of a fresh interval fires immediately
                        ticker.tick().await;
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down energy monitoring loop");
                    break;
                }
            }
        }
    }

    /// Collect, estimate and publish one cycle
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let start = Instant::now();

        let samples = match collect_samples(self.source.as_ref()).await {
            Ok(samples) => samples,
            Err(e) => {
                self.metrics.record_error("collection", components::COLLECTOR);
                self.health
                    .set_degraded(components::COLLECTOR, format!("Inventory unavailable: {e}"))
                    .await;
                return Err(e);
            }
        };
        self.health.set_healthy(components::COLLECTOR).await;

        let results = self.engine.estimate_all(&samples);
        for result in &results {
            self.metrics.record_estimate(result);
            debug!(
                instance_id = %result.instance_id,
                energy_consumption_watts = result.energy_consumption_watts,
                carbon_footprint_kg = result.carbon_footprint_kg,
                "Estimated instance"
            );
        }
        self.metrics.set_instances_monitored(results.len() as i64);
        self.store.replace_all(&results);

        let mut record_errors = 0;
        if let Some(recorder) = &self.recorder {
            match recorder.record_cycle(chrono::Utc::now(), &samples, &results) {
                Ok(()) => self.health.set_healthy(components::RECORDER).await,
                Err(e) => {
                    record_errors += 1;
                    warn!(error = %e, "Failed to record collection cycle");
                    self.metrics.record_error("record", components::RECORDER);
                    self.health
                        .set_degraded(components::RECORDER, e.to_string())
                        .await;
                }
            }
        }

        let instances = results.len();
        if let Err(e) = self.results_tx.try_send(results) {
            debug!(error = %e, "No consumer for estimation results");
        }

        let elapsed = start.elapsed();
        self.metrics.observe_collection_latency(elapsed.as_secs_f64());
        self.logger
            .log_cycle(instances, record_errors, elapsed.as_millis());

        Ok(CycleReport {
            instances,
            record_errors,
            elapsed,
        })
    }

    fn current_interval(&self) -> Duration {
        let base = if self.degraded_mode {
            self.config.degraded_interval
        } else {
            self.config.interval
        };
        base + Duration::from_millis(rand_jitter(self.config.jitter.as_millis() as u64))
    }

    fn check_cycle_duration(&mut self, elapsed: Duration) {
        let threshold = self.config.slow_cycle_threshold;

        if elapsed > threshold && !self.degraded_mode {
            warn!(
                elapsed_ms = elapsed.as_millis(),
                "Entering degraded mode due to slow collection"
            );
            self.degraded_mode = true;
        } else if elapsed < threshold / 2 && self.degraded_mode {
            info!("Exiting degraded mode, collection performance improved");
            self.degraded_mode = false;
        }
    }
}

/// Random jitter in `[0, max_ms)`
fn rand_jitter(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..max_ms)
}

/// Builder for the monitoring loop
pub struct MonitorLoopBuilder {
    source: Option<Arc<dyn InstanceSource>>,
    engine: Option<Arc<EstimationEngine>>,
    metrics: Option<Arc<dyn MetricsSink>>,
    store: Option<Arc<EstimateStore>>,
    recorder: Option<DataRecorder>,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
    config: MonitorConfig,
}

impl MonitorLoopBuilder {
    pub fn new() -> Self {
        Self {
            source: None,
            engine: None,
            metrics: None,
            store: None,
            recorder: None,
            health: None,
            logger: None,
            config: MonitorConfig::default(),
        }
    }

    pub fn source(mut self, source: Arc<dyn InstanceSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn engine(mut self, engine: Arc<EstimationEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn store(mut self, store: Arc<EstimateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn recorder(mut self, recorder: DataRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.config.jitter = jitter;
        self
    }

    pub fn degraded_interval(mut self, interval: Duration) -> Self {
        self.config.degraded_interval = interval;
        self
    }

    pub fn slow_cycle_threshold(mut self, threshold: Duration) -> Self {
        self.config.slow_cycle_threshold = threshold;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// Build the loop and the receiving end of its result channel
    ///
    /// Source and metrics sink are required; the engine, store, health
    /// registry and logger default to fresh instances. Both intervals must be
    /// non-zero.
    pub fn build(self) -> Result<(MonitorLoop, mpsc::Receiver<Vec<EstimationResult>>)> {
        if self.config.interval.is_zero() {
            bail!("Monitoring interval must be greater than zero");
        }
        if self.config.degraded_interval.is_zero() {
            bail!("Degraded monitoring interval must be greater than zero");
        }
        let source = self
            .source
            .ok_or_else(|| anyhow::anyhow!("Instance source is required"))?;
        let metrics = self
            .metrics
            .ok_or_else(|| anyhow::anyhow!("Metrics sink is required"))?;
        let (results_tx, results_rx) = mpsc::channel(self.config.buffer_size.max(1));

        let monitor = MonitorLoop {
            source,
            engine: self.engine.unwrap_or_default(),
            metrics,
            store: self.store.unwrap_or_default(),
            recorder: self.recorder,
            health: self.health.unwrap_or_default(),
            logger: self
                .logger
                .unwrap_or_else(|| StructuredLogger::new("unknown")),
            config: self.config,
            results_tx,
            degraded_mode: false,
        };

        Ok((monitor, results_rx))
    }
}

impl Default for MonitorLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
