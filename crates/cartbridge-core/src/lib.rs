//! Cartbridge Core - Field-mapping engine and migration lifecycle for store data sync
//!
//! This crate rewrites source-platform records (Shopware) into destination-platform
//! documents (Shopify) using declarative, per-dataflow rule sets, and tracks each
//! migrated record through its lifecycle.
//!
//! # Main Components
//!
//! - **Error Handling**: Crate-wide error type built on `thiserror` and `anyhow`
//! - **Core Types**: Connectors, dataflows and field mappings
//! - **Mapping Engine**: Path accessor, transformation dispatch and the rule pipeline
//! - **Migration Lifecycle**: Logs, status machine, orchestrator handoff and callbacks
//!
//! # Example
//!
//! ```
//! use cartbridge_core::{DataCategory, MappingPipeline, Result};
//! use cartbridge_core::mapping::built_in;
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let pipeline = MappingPipeline::new(built_in::default_mappings(DataCategory::Product, None));
//!     let outcome = pipeline.transform(&json!({"id": "abc", "name": "Shoe"}));
//!     // price is required by the default product rules
//!     assert!(!outcome.is_success());
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod error;
pub mod mapping;
pub mod migration;
pub mod types;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use types::{
    // Endpoints
    Connector, ConnectorType,

    // Dataflows and their rules
    DataCategory, Dataflow, DataflowStatus, FieldMapping,
};

pub use mapping::{
    DispatchDefaults, EntityLookup, FieldMappingBuilder, InMemoryEntityLookup, MappingError,
    MappingPipeline, RuleFailure, TransformOutcome, TransformType,
};

pub use migration::{
    DataflowCatalog, InMemoryMigrationLogStore, InMemoryOrchestrator, LifecycleError,
    MigrationLog, MigrationLogStore, MigrationService, MigrationStatus, Orchestrator,
    StatusCallback, WebhookEvent,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
