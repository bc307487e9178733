//! Demonstration connector
//!
//! Logs every batch and scan event it receives. With a prints metadata file
//! it also runs the one-time imports at start-up and a full import on every
//! synchronization.

use crate::api::AmVisionApi;
use crate::importer::Importer;
use crate::synchronizer::Synchronize;
use crate::webhook::{handler_fn, EventHandler};
use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Events the demo connector subscribes to
pub const DEMO_EVENTS: &[&str] = &[
    "batch.started",
    "batch.ended",
    "batch.reset",
    "scan.captured",
    "scan.rejected",
    "scan.assigned",
    "scan.unassigned",
];

pub struct DemoConnector {
    importer: Importer,
    prints: Option<PathBuf>,
}

impl DemoConnector {
    pub fn new(api: Arc<dyn AmVisionApi>, prints: Option<PathBuf>) -> Self {
        Self {
            importer: Importer::new(api),
            prints,
        }
    }

    /// Handlers to register with the dispatcher
    pub fn handlers(&self) -> Vec<(&'static str, Arc<dyn EventHandler>)> {
        let log_event = handler_fn(log_event);
        DEMO_EVENTS
            .iter()
            .map(|event| (*event, log_event.clone()))
            .collect()
    }

    /// Start-up work: the one-time imports when a prints file is set
    pub async fn prepare(&self) -> anyhow::Result<()> {
        if let Some(prints) = &self.prints {
            self.importer
                .one_time_imports_from(prints)
                .await
                .with_context(|| format!("one-time import of {} failed", prints.display()))?;
        }
        Ok(())
    }
}

fn log_event(event: &str, data: &Value) -> anyhow::Result<Option<String>> {
    info!(event = %event, data = %data, "Got event");
    Ok(None)
}

#[async_trait]
impl Synchronize for DemoConnector {
    async fn synchronize(&self) -> anyhow::Result<()> {
        info!("Synchronizing");
        if let Some(prints) = &self.prints {
            self.importer
                .import_all_from(prints)
                .await
                .with_context(|| format!("import of {} failed", prints.display()))?;
        }
        Ok(())
    }
}
