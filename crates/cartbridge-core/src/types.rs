//! Core data model for Cartbridge
//!
//! Connectors describe the two commerce platforms, dataflows pair a source and
//! destination connector with an ordered rule set, and field mappings are the
//! individual rules. Serde field names follow the persisted wire format so
//! stored rule sets load unchanged.

use crate::error::{Error, Result};
use crate::mapping::TransformType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform role of a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorType {
    /// Source platform
    Shopware,
    /// Destination platform
    Shopify,
}

impl fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorType::Shopware => write!(f, "shopware"),
            ConnectorType::Shopify => write!(f, "shopify"),
        }
    }
}

/// Connection details for an external system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub connector_type: ConnectorType,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Connector {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        connector_type: ConnectorType,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            connector_type,
            url: url.into(),
            username: None,
            api_key: None,
            api_secret: None,
            access_token: None,
            password: None,
            is_active: true,
        }
    }
}

/// Kind of record a dataflow moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCategory {
    Product,
    Order,
}

impl DataCategory {
    /// Primary entity name used by webhook payload entries
    pub fn entity_name(&self) -> &'static str {
        match self {
            DataCategory::Product => "product",
            DataCategory::Order => "order",
        }
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity_name())
    }
}

impl std::str::FromStr for DataCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "product" => Ok(DataCategory::Product),
            "order" => Ok(DataCategory::Order),
            other => Err(Error::validation(
                "type",
                format!("unknown data category '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataflowStatus {
    #[default]
    Active,
    Inactive,
}

/// A single declarative rule: copy `source_field` into `dest_field`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataflow_id: Option<u64>,
    pub source_field: String,
    pub dest_field: String,
    #[serde(default)]
    pub is_required: bool,
    /// Used only when the source is absent and the rule is not required
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub transform_type: TransformType,
    /// Opaque JSON, interpreted only when the rule is applied
    #[serde(default)]
    pub transform_config: String,
}

impl FieldMapping {
    /// Direct mapping with no transformation
    pub fn direct(source_field: impl Into<String>, dest_field: impl Into<String>) -> Self {
        Self {
            id: None,
            dataflow_id: None,
            source_field: source_field.into(),
            dest_field: dest_field.into(),
            is_required: false,
            default_value: String::new(),
            transform_type: TransformType::None,
            transform_config: String::new(),
        }
    }

    /// Creation-time check; the transform config is deliberately not inspected
    pub fn validate(&self) -> Result<()> {
        if self.source_field.trim().is_empty() {
            return Err(Error::validation("source_field", "must not be empty"));
        }
        if self.dest_field.trim().is_empty() {
            return Err(Error::validation("dest_field", "must not be empty"));
        }
        Ok(())
    }
}

/// A named pairing of source and destination connectors plus a rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataflow {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub category: DataCategory,
    #[serde(default)]
    pub status: DataflowStatus,
    pub source_connector_id: u64,
    pub dest_connector_id: u64,
    #[serde(default)]
    pub field_mappings: Vec<FieldMapping>,
}

impl Dataflow {
    pub fn is_active(&self) -> bool {
        self.status == DataflowStatus::Active
    }

    /// Check the dataflow against its resolved connectors
    pub fn validate(&self, source: &Connector, dest: &Connector) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("name", "dataflow name must not be empty"));
        }
        if self.source_connector_id == self.dest_connector_id {
            return Err(Error::validation(
                "dest_connector_id",
                "source and destination connectors must be different",
            ));
        }
        if source.id != self.source_connector_id || dest.id != self.dest_connector_id {
            return Err(Error::validation(
                "source_connector_id",
                "connectors do not match the dataflow references",
            ));
        }
        if source.connector_type != ConnectorType::Shopware {
            return Err(Error::validation(
                "source_connector_id",
                format!("source connector must be shopware, got {}", source.connector_type),
            ));
        }
        if dest.connector_type != ConnectorType::Shopify {
            return Err(Error::validation(
                "dest_connector_id",
                format!("destination connector must be shopify, got {}", dest.connector_type),
            ));
        }
        for mapping in &self.field_mappings {
            mapping.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connectors() -> (Connector, Connector) {
        (
            Connector::new(1, "Shopware EU", ConnectorType::Shopware, "https://sw.test"),
            Connector::new(2, "Shopify", ConnectorType::Shopify, "https://shop.test"),
        )
    }

    fn dataflow() -> Dataflow {
        Dataflow {
            id: 10,
            name: "Products".to_string(),
            description: String::new(),
            category: DataCategory::Product,
            status: DataflowStatus::Active,
            source_connector_id: 1,
            dest_connector_id: 2,
            field_mappings: vec![FieldMapping::direct("name", "title")],
        }
    }

    #[test]
    fn test_field_mapping_wire_format() {
        let mapping: FieldMapping = serde_json::from_value(json!({
            "dataflow_id": 3,
            "source_field": "stock",
            "dest_field": "variants[0].inventoryQuantity",
            "transform_type": "convert",
            "transform_config": "{\"type\": \"int\"}"
        }))
        .unwrap();

        assert_eq!(mapping.dataflow_id, Some(3));
        assert!(!mapping.is_required);
        assert_eq!(mapping.default_value, "");
        assert_eq!(mapping.transform_type, TransformType::Convert);
    }

    #[test]
    fn test_field_mapping_defaults_to_none_transform() {
        let mapping: FieldMapping =
            serde_json::from_value(json!({"source_field": "a", "dest_field": "b"})).unwrap();
        assert_eq!(mapping.transform_type, TransformType::None);
    }

    #[test]
    fn test_field_mapping_validate() {
        assert!(FieldMapping::direct("a", "b").validate().is_ok());
        assert!(FieldMapping::direct("", "b").validate().is_err());
        assert!(FieldMapping::direct("a", " ").validate().is_err());
    }

    #[test]
    fn test_field_mapping_validate_ignores_config() {
        let mut mapping = FieldMapping::direct("a", "b");
        mapping.transform_type = TransformType::Convert;
        mapping.transform_config = "not json".to_string();
        assert!(mapping.validate().is_ok());
    }

    #[test]
    fn test_dataflow_validate() {
        let (source, dest) = connectors();
        assert!(dataflow().validate(&source, &dest).is_ok());
    }

    #[test]
    fn test_dataflow_rejects_same_connector() {
        let (source, _) = connectors();
        let mut flow = dataflow();
        flow.dest_connector_id = 1;
        assert!(flow.validate(&source, &source).is_err());
    }

    #[test]
    fn test_dataflow_rejects_swapped_roles() {
        let (source, dest) = connectors();
        let mut flow = dataflow();
        flow.source_connector_id = 2;
        flow.dest_connector_id = 1;
        let err = flow.validate(&dest, &source).unwrap_err();
        assert!(err.to_string().contains("shopware"));
    }

    #[test]
    fn test_dataflow_rejects_empty_name() {
        let (source, dest) = connectors();
        let mut flow = dataflow();
        flow.name = String::new();
        assert!(matches!(
            flow.validate(&source, &dest),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("order".parse::<DataCategory>().unwrap(), DataCategory::Order);
        assert!("customer".parse::<DataCategory>().is_err());
    }
}
