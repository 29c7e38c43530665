//! Migration lifecycle service
//!
//! Ingestion creates one `pending` log per matching active dataflow and hands
//! it to the orchestrator while holding that row, so a fast status callback can
//! only ever observe the row after the `in_progress` write. Transformation runs
//! and callbacks go through the same per-row update.

use super::orchestrator::Orchestrator;
use super::store::MigrationLogStore;
use super::types::{HandoffRequest, MigrationLog, StatusCallback};
use crate::error::{Error, Result};
use crate::mapping::{DispatchDefaults, EntityLookup, MappingPipeline, TransformOutcome};
use crate::types::{DataCategory, Dataflow};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct MigrationService {
    store: Arc<dyn MigrationLogStore>,
    orchestrator: Arc<dyn Orchestrator>,
    defaults: DispatchDefaults,
}

impl std::fmt::Debug for MigrationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationService")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl MigrationService {
    pub fn new(store: Arc<dyn MigrationLogStore>, orchestrator: Arc<dyn Orchestrator>) -> Self {
        Self {
            store,
            orchestrator,
            defaults: DispatchDefaults::default(),
        }
    }

    /// Dispatch defaults used by transformation runs
    pub fn with_defaults(mut self, defaults: DispatchDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn store(&self) -> &Arc<dyn MigrationLogStore> {
        &self.store
    }

    /// Create and hand off one log per active dataflow of `category`
    ///
    /// A dataflow whose log cannot be created is skipped; the others proceed.
    #[instrument(skip(self, dataflows, source_document))]
    pub fn ingest(
        &self,
        dataflows: &[&Dataflow],
        category: DataCategory,
        source_identifier: &str,
        source_document: &Value,
    ) -> Result<Vec<MigrationLog>> {
        let mut logs = Vec::new();

        for dataflow in dataflows
            .iter()
            .filter(|flow| flow.is_active() && flow.category == category)
        {
            let log = match self.store.insert(MigrationLog::new(
                dataflow.id,
                source_identifier,
                source_document.clone(),
            )) {
                Ok(log) => log,
                Err(e) => {
                    warn!(dataflow_id = dataflow.id, error = %e, "Could not create migration log");
                    continue;
                }
            };

            let request = HandoffRequest {
                dataflow_id: dataflow.id,
                migration_id: log.id,
                source_data: source_document.clone(),
            };

            let handed_off = self.store.update(log.id, &mut |row| {
                match self.orchestrator.start_execution(&request) {
                    Ok(handle) => row.mark_in_progress(handle)?,
                    Err(e) => {
                        warn!(migration_id = row.id, error = %e, "Handoff failed");
                        row.mark_failed(e.to_string())?;
                    }
                }
                Ok(())
            })?;

            info!(
                migration_id = handed_off.id,
                dataflow_id = dataflow.id,
                status = %handed_off.status,
                "Migration ingested"
            );
            logs.push(handed_off);
        }

        Ok(logs)
    }

    /// Run a dataflow's rule set over the log's source snapshot
    ///
    /// Success records the transformed snapshot; an aborted run marks the log
    /// failed with the failure text.
    #[instrument(skip(self, dataflow, lookup), fields(dataflow_id = dataflow.id))]
    pub fn run_transformation(
        &self,
        dataflow: &Dataflow,
        migration_id: u64,
        lookup: Option<Arc<dyn EntityLookup>>,
    ) -> Result<TransformOutcome> {
        let log = self.store.get(migration_id)?;
        if log.dataflow_id != dataflow.id {
            return Err(Error::validation(
                "dataflow_id",
                format!(
                    "migration {} belongs to dataflow {}, not {}",
                    migration_id, log.dataflow_id, dataflow.id
                ),
            ));
        }

        let mut pipeline =
            MappingPipeline::for_dataflow(dataflow).with_defaults(self.defaults.clone());
        if let Some(lookup) = lookup {
            pipeline = pipeline.with_lookup(lookup);
        }

        let outcome = pipeline.transform(&log.source_payload);
        match &outcome.failure {
            None => {
                self.store.update(migration_id, &mut |row| {
                    Ok(row.record_transformed(outcome.document.clone())?)
                })?;
            }
            Some(failure) => {
                let message = failure.to_string();
                self.store
                    .update(migration_id, &mut |row| Ok(row.mark_failed(message.clone())?))?;
                warn!(migration_id, error = %message, "Migration failed during transformation");
            }
        }

        Ok(outcome)
    }

    /// Apply an orchestrator status callback to its log
    #[instrument(skip(self, callback), fields(migration_id = callback.migration_id, status = %callback.status))]
    pub fn handle_callback(&self, callback: &StatusCallback) -> Result<MigrationLog> {
        let log = self
            .store
            .update(callback.migration_id, &mut |row| Ok(row.apply_callback(callback)?))?;
        info!(status = %log.status, "Migration status updated");
        Ok(log)
    }
}
