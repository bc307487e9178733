//! Connector runtime
//!
//! Serves the webhook router and drives the synchronization scheduler
//! until the shutdown future resolves.

use crate::observability::StructuredLogger;
use crate::synchronizer::{
    SyncScheduler, Synchronize, DEFAULT_INITIAL_DELAY, DEFAULT_SYNC_INTERVAL,
};
use crate::webhook::Dispatcher;
use anyhow::Context;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

/// Runtime settings for a connector
#[derive(Debug, Clone)]
pub struct ConnectorSettings {
    /// Address the webhook server binds to
    pub ip: String,
    pub port: u16,
    /// Synchronize once and exit instead of serving
    pub single_sync: bool,
    pub interval: Duration,
    pub initial_delay: Duration,
}

impl ConnectorSettings {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
            single_sync: false,
            interval: DEFAULT_SYNC_INTERVAL,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

pub struct Connector {
    settings: ConnectorSettings,
    dispatcher: Dispatcher,
    sync: Arc<dyn Synchronize>,
    logger: StructuredLogger,
}

impl Connector {
    pub fn new(
        settings: ConnectorSettings,
        dispatcher: Dispatcher,
        sync: Arc<dyn Synchronize>,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            settings,
            dispatcher,
            sync,
            logger,
        }
    }

    /// Run the connector.
    ///
    /// In single-sync mode the sync hook runs once and its result is
    /// returned. Otherwise the webhook server and the scheduler run until
    /// `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let scheduler = SyncScheduler::new(
            self.settings.interval,
            self.settings.initial_delay,
            self.logger.clone(),
        );

        if self.settings.single_sync {
            info!("Running a single synchronization");
            return scheduler.run_once(self.sync.as_ref()).await;
        }

        let addr = self.settings.bind_addr();
        info!(
            addr = %addr,
            endpoint = %self.dispatcher.endpoint_url(),
            "Starting webhook server"
        );
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        let app = self.dispatcher.into_router();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let scheduler_handle = tokio::spawn(scheduler.run(self.sync.clone(), shutdown_rx));

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        // the scheduler may already be gone if it panicked
        let _ = shutdown_tx.send(());
        scheduler_handle
            .await
            .context("synchronization scheduler failed")?;

        served.context("webhook server failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeApi;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSync {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl Synchronize for CountingSync {
        async fn synchronize(&self) -> anyhow::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSync;

    #[async_trait]
    impl Synchronize for FailingSync {
        async fn synchronize(&self) -> anyhow::Result<()> {
            anyhow::bail!("import failed")
        }
    }

    fn connector(settings: ConnectorSettings, sync: Arc<dyn Synchronize>) -> Connector {
        let api = Arc::new(FakeApi::new());
        let dispatcher = Dispatcher::new(api, "http://127.0.0.1:0/hook/");
        Connector::new(settings, dispatcher, sync, StructuredLogger::new("test"))
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ConnectorSettings::new("0.0.0.0", 8080);
        assert_eq!(settings.bind_addr(), "0.0.0.0:8080");
        assert_eq!(settings.interval, Duration::from_secs(1800));
        assert_eq!(settings.initial_delay, Duration::from_secs(60));
        assert!(!settings.single_sync);
    }

    #[tokio::test]
    async fn test_single_sync_runs_once_without_serving() {
        let sync = Arc::new(CountingSync::default());
        let mut settings = ConnectorSettings::new("127.0.0.1", 0);
        settings.single_sync = true;

        // never resolves; single-sync mode must not wait on it
        connector(settings, sync.clone())
            .run(std::future::pending::<()>())
            .await
            .unwrap();

        assert_eq!(sync.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_sync_returns_failure() {
        let mut settings = ConnectorSettings::new("127.0.0.1", 0);
        settings.single_sync = true;

        let err = connector(settings, Arc::new(FailingSync))
            .run(std::future::pending::<()>())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("import failed"));
    }

    #[tokio::test]
    async fn test_server_stops_on_shutdown() {
        let sync = Arc::new(CountingSync::default());
        let settings = ConnectorSettings::new("127.0.0.1", 0);

        connector(settings, sync.clone()).run(async {}).await.unwrap();

        // the initial delay has not elapsed
        assert_eq!(sync.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let settings = ConnectorSettings::new("256.0.0.1", 8080);

        let err = connector(settings, Arc::new(CountingSync::default()))
            .run(async {})
            .await
            .unwrap_err();

        assert!(err.to_string().contains("failed to bind 256.0.0.1:8080"));
    }
}
