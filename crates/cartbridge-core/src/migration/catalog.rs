//! In-memory registry of connectors and dataflows

use super::store::MigrationLogStore;
use super::types::LifecycleError;
use crate::error::{Error, Result};
use crate::types::{Connector, ConnectorType, DataCategory, Dataflow, DataflowStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Serialized form of a catalog, as loaded from a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub connectors: Vec<Connector>,
    #[serde(default)]
    pub dataflows: Vec<Dataflow>,
}

#[derive(Debug, Clone, Default)]
pub struct DataflowCatalog {
    connectors: BTreeMap<u64, Connector>,
    dataflows: BTreeMap<u64, Dataflow>,
}

impl DataflowCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, validating every dataflow against its connectors
    pub fn from_document(document: CatalogDocument) -> Result<Self> {
        let connectors: BTreeMap<u64, Connector> = document
            .connectors
            .into_iter()
            .map(|connector| (connector.id, connector))
            .collect();

        let mut catalog = Self::new();
        for dataflow in document.dataflows {
            let source = connectors
                .get(&dataflow.source_connector_id)
                .cloned()
                .ok_or_else(|| Error::not_found("Connector", dataflow.source_connector_id))?;
            let dest = connectors
                .get(&dataflow.dest_connector_id)
                .cloned()
                .ok_or_else(|| Error::not_found("Connector", dataflow.dest_connector_id))?;
            catalog.register(dataflow, source, dest)?;
        }
        for (id, connector) in connectors {
            catalog.connectors.entry(id).or_insert(connector);
        }
        Ok(catalog)
    }

    /// Validate and store a dataflow with its connectors
    pub fn register(&mut self, dataflow: Dataflow, source: Connector, dest: Connector) -> Result<()> {
        for connector in [&source, &dest] {
            if connector.name.trim().is_empty() || connector.url.trim().is_empty() {
                return Err(Error::validation(
                    "connector",
                    format!("connector {} needs a name and a url", connector.id),
                ));
            }
        }
        dataflow.validate(&source, &dest)?;
        if self.dataflows.contains_key(&dataflow.id) {
            return Err(Error::validation(
                "id",
                format!("dataflow {} is already registered", dataflow.id),
            ));
        }

        self.connectors.insert(source.id, source);
        self.connectors.insert(dest.id, dest);
        self.dataflows.insert(dataflow.id, dataflow);
        Ok(())
    }

    pub fn get(&self, dataflow_id: u64) -> Result<&Dataflow> {
        self.dataflows
            .get(&dataflow_id)
            .ok_or_else(|| Error::not_found("Dataflow", dataflow_id))
    }

    pub fn connector(&self, connector_id: u64) -> Result<&Connector> {
        self.connectors
            .get(&connector_id)
            .ok_or_else(|| Error::not_found("Connector", connector_id))
    }

    /// Dataflows filtered by category and status
    pub fn list(
        &self,
        category: Option<DataCategory>,
        status: Option<DataflowStatus>,
    ) -> Vec<&Dataflow> {
        self.dataflows
            .values()
            .filter(|flow| category.map_or(true, |c| flow.category == c))
            .filter(|flow| status.map_or(true, |s| flow.status == s))
            .collect()
    }

    /// Active dataflows for a category, in id order
    pub fn active_for(&self, category: DataCategory) -> Vec<&Dataflow> {
        self.list(Some(category), Some(DataflowStatus::Active))
    }

    /// Source connector whose url contains `domain`
    pub fn source_connector_for_domain(&self, domain: &str) -> Option<&Connector> {
        if domain.is_empty() {
            return None;
        }
        self.connectors.values().find(|connector| {
            connector.connector_type == ConnectorType::Shopware && connector.url.contains(domain)
        })
    }

    /// Remove a dataflow and its field mappings, refused while logs reference it
    pub fn delete(&mut self, dataflow_id: u64, logs: &dyn MigrationLogStore) -> Result<Dataflow> {
        self.get(dataflow_id)?;

        let log_count = logs.count_for_dataflow(dataflow_id)?;
        if log_count > 0 {
            return Err(LifecycleError::DataflowInUse {
                dataflow_id,
                log_count,
            }
            .into());
        }

        let removed = self
            .dataflows
            .remove(&dataflow_id)
            .ok_or_else(|| Error::not_found("Dataflow", dataflow_id))?;
        info!(
            dataflow_id,
            mappings = removed.field_mappings.len(),
            "Deleted dataflow"
        );
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.dataflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataflows.is_empty()
    }

    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            connectors: self.connectors.values().cloned().collect(),
            dataflows: self.dataflows.values().cloned().collect(),
        }
    }
}
