//! Migration lifecycle: ingestion, orchestrator handoff and status callbacks
//!
//! Every source event that matches an active dataflow becomes one
//! [`MigrationLog`]. The [`MigrationService`] drives those logs through the
//! status machine in [`types`], persisting every transition through a
//! [`MigrationLogStore`] so that concurrent writers to the same row serialize.
//!
//! # Module Organization
//!
//! - [`types`] - Log records, status machine, handoff and callback shapes
//! - [`store`] - Row-locked log persistence
//! - [`orchestrator`] - External orchestrator seam
//! - [`webhook`] - Source-platform webhook envelope
//! - [`catalog`] - Connector and dataflow registry
//! - [`service`] - Ingestion, transformation runs and callbacks

pub mod types;

pub mod store;

pub mod orchestrator;

pub mod webhook;

pub mod catalog;

pub mod service;


pub use catalog::{CatalogDocument, DataflowCatalog};
pub use orchestrator::{InMemoryOrchestrator, Orchestrator};
pub use service::MigrationService;
pub use store::{InMemoryMigrationLogStore, MigrationLogStore};
pub use types::{HandoffRequest, LifecycleError, MigrationLog, MigrationStatus, StatusCallback};
pub use webhook::{WebhookData, WebhookEvent, WebhookPayloadEntry, WebhookSource};
