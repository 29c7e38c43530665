//! Ingest command handler
//!
//! Replays a source-platform webhook against a catalog file using the
//! in-memory log store and orchestrator, optionally running each handed-off
//! dataflow's rule set and finishing the logs with a simulated callback.

use super::utils::{load_lookup, read_structured};
use crate::cli::{CallbackStatus, IngestArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::{redaction, timing::Timer};
use crate::output::OutputWriter;
use cartbridge_core::migration::CatalogDocument;
use cartbridge_core::{
    DataCategory, DataflowCatalog, EntityLookup, InMemoryMigrationLogStore, InMemoryOrchestrator,
    MigrationLog, MigrationService, MigrationStatus, StatusCallback, WebhookEvent,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Handle the ingest command
#[instrument(skip(config, output), fields(webhook = %args.webhook.display()))]
pub async fn handle_ingest(
    args: IngestArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("ingest", &args.webhook.display().to_string());

    let spinner = output.spinner("Simulating ingestion...");
    let result = simulate(&args, config);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let mut logs = result?;
    if logs.is_empty() {
        output.warning("No active dataflow matched the event")?;
    }
    if args.redact {
        logs.iter_mut().for_each(redact_log);
    }

    output.section("Migration Logs")?;
    output.migration_logs(&logs)?;

    let failed = logs
        .iter()
        .filter(|log| log.status == MigrationStatus::Failed)
        .count();
    if failed > 0 {
        output.error(&format!("{} of {} migration(s) failed", failed, logs.len()))?;
    }
    Ok(())
}

/// Run the whole simulation and return the final state of every created log
fn simulate(args: &IngestArgs, config: &Config) -> Result<Vec<MigrationLog>> {
    let event: WebhookEvent = read_structured(&args.webhook)?;
    let catalog = DataflowCatalog::from_document(read_structured::<CatalogDocument>(&args.dataflows)?)?;
    let document: Value = read_structured(&args.document)?;

    let category = event.category()?;
    let source_identifier = event.source_identifier(category)?;
    debug!(%category, %source_identifier, "Resolved webhook event");

    if category == DataCategory::Product {
        let domain = event.source_domain();
        let connector = catalog
            .source_connector_for_domain(domain)
            .ok_or_else(|| cartbridge_core::Error::not_found("Connector", domain))?;
        debug!(connector_id = connector.id, "Matched source connector");
    }

    let store = Arc::new(InMemoryMigrationLogStore::new());
    let orchestrator = Arc::new(InMemoryOrchestrator::new(
        config.orchestrator.handle_prefix.clone(),
    ));
    orchestrator.set_available(!config.orchestrator.fail_handoff);
    let service = MigrationService::new(store, orchestrator).with_defaults(config.dispatch_defaults());

    let dataflows = catalog.active_for(category);
    let created = service.ingest(&dataflows, category, &source_identifier, &document)?;
    info!(logs = created.len(), "Event ingested");

    if args.transform {
        let lookup: Option<Arc<dyn EntityLookup>> =
            load_lookup(args.lookup.as_deref(), config.mapping.lookup_file.as_deref())?
                .map(|lookup| Arc::new(lookup) as Arc<dyn EntityLookup>);

        for log in created.iter().filter(|log| log.status == MigrationStatus::InProgress) {
            let dataflow = catalog.get(log.dataflow_id)?;
            let outcome = service.run_transformation(dataflow, log.id, lookup.clone())?;
            if let Some(failure) = outcome.failure {
                warn!(migration_id = log.id, error = %failure, "Transformation failed");
            }
        }
    }

    if let Some(status) = args.callback {
        for log in &created {
            if service.store().get(log.id)?.status != MigrationStatus::InProgress {
                continue;
            }
            let callback = match status {
                CallbackStatus::Success => {
                    StatusCallback::success(log.id, format!("simulated-{}", log.id))
                }
                CallbackStatus::Failed => {
                    StatusCallback::failure(log.id, "simulated destination failure")
                }
            };
            service.handle_callback(&callback)?;
        }
    }

    created
        .iter()
        .map(|log| service.store().get(log.id).map_err(Error::from))
        .collect()
}

/// Drop the source snapshot and mask credentials in what remains
fn redact_log(log: &mut MigrationLog) {
    log.source_payload = Value::Null;
    if let Some(payload) = log.transformed_payload.as_mut() {
        redaction::redact_json_value(payload);
    }
    if let Some(message) = log.error_message.as_mut() {
        *message = redaction::redact_sensitive(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_json(dir: &Path, name: &str, value: Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
        path
    }

    fn fixture(dir: &Path, event: &str) -> IngestArgs {
        let catalog = json!({
            "connectors": [
                {"id": 1, "name": "Shopware", "type": "shopware", "url": "https://sw.example.test"},
                {"id": 2, "name": "Shopify", "type": "shopify", "url": "https://shop.myshopify.test"}
            ],
            "dataflows": [
                {"id": 10, "name": "Products", "type": "product", "status": "active",
                 "source_connector_id": 1, "dest_connector_id": 2,
                 "field_mappings": [
                     {"source_field": "name", "dest_field": "title"},
                     {"source_field": "productNumber", "dest_field": "variants[0].sku", "is_required": true}
                 ]},
                {"id": 20, "name": "Orders", "type": "order", "status": "active",
                 "source_connector_id": 1, "dest_connector_id": 2,
                 "field_mappings": [{"source_field": "orderNumber", "dest_field": "name"}]}
            ]
        });
        let webhook = json!({
            "data": {
                "event": event,
                "payload": [{"entity": "product", "operation": "update", "primaryKey": "p-1"}]
            },
            "source": {"url": "https://sw.example.test/", "eventId": "e-1"},
            "timestamp": 1700000000
        });
        let document = json!({"id": "p-1", "name": "Trail Runner", "productNumber": "TR-1"});

        IngestArgs {
            webhook: write_json(dir, "webhook.json", webhook),
            dataflows: write_json(dir, "catalog.json", catalog),
            document: write_json(dir, "document.json", document),
            lookup: None,
            transform: false,
            callback: None,
            redact: false,
        }
    }

    #[test]
    fn test_ingest_hands_off_matching_dataflow() {
        let dir = TempDir::new().unwrap();
        let args = fixture(dir.path(), "product.written");

        let logs = simulate(&args, &Config::default()).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].dataflow_id, 10);
        assert_eq!(logs[0].status, MigrationStatus::InProgress);
        assert_eq!(logs[0].execution_handle.as_deref(), Some("local-run-1-1"));
    }

    #[test]
    fn test_transform_then_success_callback() {
        let dir = TempDir::new().unwrap();
        let mut args = fixture(dir.path(), "product.written");
        args.transform = true;
        args.callback = Some(CallbackStatus::Success);

        let logs = simulate(&args, &Config::default()).unwrap();
        let log = &logs[0];
        assert_eq!(log.status, MigrationStatus::Success);
        assert_eq!(log.dest_identifier.as_deref(), Some("simulated-1"));
        assert_eq!(
            log.transformed_payload,
            Some(json!({"title": "Trail Runner", "variants": [{"sku": "TR-1"}]}))
        );
        assert!(log.completed_at.is_some());
    }

    #[test]
    fn test_failed_handoff_skips_callbacks() {
        let dir = TempDir::new().unwrap();
        let mut args = fixture(dir.path(), "product.written");
        args.callback = Some(CallbackStatus::Success);
        let mut config = Config::default();
        config.orchestrator.fail_handoff = true;

        let logs = simulate(&args, &config).unwrap();
        assert_eq!(logs[0].status, MigrationStatus::Failed);
        assert!(logs[0].dest_identifier.is_none());
    }

    #[test]
    fn test_unknown_source_domain() {
        let dir = TempDir::new().unwrap();
        let args = fixture(dir.path(), "product.written");
        let webhook = json!({
            "data": {"event": "product.written",
                     "payload": [{"entity": "product", "primaryKey": "p-1"}]},
            "source": {"url": "https://elsewhere.test"}
        });
        write_json(dir.path(), "webhook.json", webhook);

        let err = simulate(&args, &Config::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Core(cartbridge_core::Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_unsupported_event() {
        let dir = TempDir::new().unwrap();
        let args = fixture(dir.path(), "customer.written");
        let err = simulate(&args, &Config::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_redact_log() {
        let mut log = MigrationLog::new(10, "p-1", json!({"api_key": "secret-value"}));
        log.transformed_payload = Some(json!({"title": "x", "access_token": "abc123"}));
        log.error_message = Some("push failed: token=abcdef".to_string());

        redact_log(&mut log);
        assert_eq!(log.source_payload, Value::Null);
        assert_eq!(
            log.transformed_payload,
            Some(json!({"title": "x", "access_token": "***"}))
        );
        assert_eq!(log.error_message.as_deref(), Some("push failed: token=***"));
    }
}
