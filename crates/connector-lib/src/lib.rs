//! AM-Vision connector library
//!
//! This crate provides the building blocks for AM-Vision connectors:
//! - Authenticated client for the AM-Vision REST API
//! - Bulk importer for print metadata files
//! - Webhook registration and dispatch
//! - Periodic synchronization and the connector runtime
//! - Metrics and structured logging

pub mod api;
pub mod connector;
pub mod demo;
pub mod error;
pub mod importer;
pub mod metadata;
pub mod models;
pub mod observability;
pub mod synchronizer;
pub mod webhook;

#[cfg(test)]
mod testing;

pub use api::{AmVisionApi, ApiClient};
pub use connector::{Connector, ConnectorSettings};
pub use demo::DemoConnector;
pub use error::{ApiError, DispatchError, ImportError};
pub use importer::{ImportReport, Importer};
pub use metadata::Metadata;
pub use models::*;
pub use observability::{ConnectorMetrics, StructuredLogger};
pub use synchronizer::{NoopSync, SyncScheduler, Synchronize};
pub use webhook::{callback_url, handler_fn, Dispatcher, EventHandler};
