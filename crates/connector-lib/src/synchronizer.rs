//! Periodic synchronization loop
//!
//! Runs a connector's sync hook on a fixed interval, starting after an
//! initial delay. A failing run is logged and the next one still fires.

use crate::observability::{ConnectorMetrics, StructuredLogger};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::{interval_at, MissedTickBehavior};
use tracing::info;

/// Default time between synchronizations (30 minutes)
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Delay before the first scheduled synchronization
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(60);

/// Incremental synchronization performed by a connector
#[async_trait]
pub trait Synchronize: Send + Sync {
    /// Synchronize once. The default does nothing.
    async fn synchronize(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Connector without synchronization logic
pub struct NoopSync;

impl Synchronize for NoopSync {}

/// Scheduler for the recurring synchronization job
#[derive(Clone)]
pub struct SyncScheduler {
    interval: Duration,
    initial_delay: Duration,
    metrics: ConnectorMetrics,
    logger: StructuredLogger,
}

impl SyncScheduler {
    pub fn new(interval: Duration, initial_delay: Duration, logger: StructuredLogger) -> Self {
        Self {
            // tokio intervals cannot be zero
            interval: interval.max(Duration::from_millis(1)),
            initial_delay,
            metrics: ConnectorMetrics::new(),
            logger,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one synchronization, recording its outcome
    pub async fn run_once(&self, sync: &dyn Synchronize) -> anyhow::Result<()> {
        let start = Instant::now();
        let result = sync.synchronize().await;
        self.logger
            .log_sync(start.elapsed().as_millis(), result.as_ref().err());
        self.metrics.inc_sync_run(result.is_ok());
        result
    }

    /// Run the synchronization loop until shutdown
    pub async fn run(self, sync: Arc<dyn Synchronize>, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            initial_delay_secs = self.initial_delay.as_secs(),
            "Starting synchronization scheduler"
        );

        let start = tokio::time::Instant::now() + self.initial_delay;
        let mut ticker = interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // failures are already logged; the next tick retries
                    let _ = self.run_once(sync.as_ref()).await;
                }
                _ = shutdown.recv() => {
                    info!("Shutting down synchronization scheduler");
                    break;
                }
            }
        }
    }
}
