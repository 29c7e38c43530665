//! End-to-end lifecycle tests: webhook ingestion through status callback


use cartbridge_core::{
    Error, InMemoryMigrationLogStore, InMemoryOrchestrator, LifecycleError, MigrationLogStore,
    MigrationService, MigrationStatus, StatusCallback,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn service() -> (MigrationService, Arc<InMemoryOrchestrator>) {
    let orchestrator = Arc::new(InMemoryOrchestrator::default());
    let service = MigrationService::new(
        Arc::new(InMemoryMigrationLogStore::new()),
        orchestrator.clone(),
    );
    (service, orchestrator)
}

#[test]
fn test_product_webhook_to_success() {
    let catalog = test_support::catalog();
    let (service, orchestrator) = service();

    let event = test_support::webhook("product.written", "product", "0190a1b2c3");
    let category = event.category().unwrap();
    let source_id = event.source_identifier(category).unwrap();
    let connector = catalog
        .source_connector_for_domain(event.source_domain())
        .unwrap();
    assert_eq!(connector.id, 1);

    let logs = service
        .ingest(
            &catalog.active_for(category),
            category,
            &source_id,
            &test_support::shopware_product(),
        )
        .unwrap();
    assert_eq!(logs.len(), 1);
    let log = &logs[0];
    assert_eq!(log.status, MigrationStatus::InProgress);
    assert_eq!(orchestrator.started()[0].0, log.execution_handle.clone().unwrap());

    let outcome = service
        .run_transformation(catalog.get(log.dataflow_id).unwrap(), log.id, None)
        .unwrap();
    assert!(outcome.is_success());

    let done = service
        .handle_callback(&StatusCallback::success(log.id, "gid://shopify/Product/901"))
        .unwrap();
    assert_eq!(done.status, MigrationStatus::Success);
    assert_eq!(done.source_identifier, "0190a1b2c3");
    assert_eq!(done.dest_identifier.as_deref(), Some("gid://shopify/Product/901"));
    assert_eq!(done.transformed_payload.unwrap()["title"], json!("Trail Runner"));
    assert!(done.completed_at.unwrap() >= done.created_at);
}

#[test]
fn test_order_webhook_failure_callback() {
    let catalog = test_support::catalog();
    let (service, _) = service();

    let event = test_support::webhook("order.placed", "order", "o-77");
    let category = event.category().unwrap();
    let logs = service
        .ingest(
            &catalog.active_for(category),
            category,
            &event.source_identifier(category).unwrap(),
            &json!({"orderNumber": "10042"}),
        )
        .unwrap();
    assert_eq!(logs[0].dataflow_id, 20);

    let mut callback = StatusCallback::failure(logs[0].id, "");
    callback.error_message = None;
    let failed = service.handle_callback(&callback).unwrap();
    assert_eq!(failed.status, MigrationStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("orchestrator reported failure"));
}

#[test]
fn test_unsupported_webhook_event() {
    let event = test_support::webhook("customer.written", "customer", "c-1");
    assert!(matches!(event.category(), Err(Error::Validation { .. })));
}

#[test]
fn test_webhook_without_matching_entity() {
    let event = test_support::webhook("product.written", "product_translation", "t-1");
    let category = event.category().unwrap();
    let err = event.source_identifier(category).unwrap_err();
    assert!(err.to_string().contains("Could not determine source identifier"));
}

#[test]
fn test_dataflow_delete_blocked_by_history() {
    let mut catalog = test_support::catalog();
    let (service, _) = service();

    service
        .ingest(
            &catalog.active_for(cartbridge_core::DataCategory::Product),
            cartbridge_core::DataCategory::Product,
            "p-1",
            &test_support::shopware_product(),
        )
        .unwrap();

    let err = catalog.delete(10, service.store().as_ref()).unwrap_err();
    assert!(matches!(
        err,
        Error::Lifecycle(LifecycleError::DataflowInUse { dataflow_id: 10, .. })
    ));
    assert_eq!(service.store().count_for_dataflow(10).unwrap(), 1);

    // The order flow has no history and can go
    assert_eq!(catalog.delete(20, service.store().as_ref()).unwrap().id, 20);
    assert_eq!(catalog.len(), 1);
}
