//! Source-platform webhook envelope
//!
//! The HTTP boundary is out of scope; this is only the payload shape plus the
//! two questions ingestion asks of it: which data category the event is about,
//! and which source record it names.

use crate::error::{Error, Result};
use crate::types::DataCategory;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayloadEntry {
    pub entity: String,
    #[serde(default)]
    pub operation: String,
    pub primary_key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updated_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub payload: Vec<WebhookPayloadEntry>,
    pub event: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSource {
    pub url: String,
    #[serde(default)]
    pub event_id: String,
}

/// Inbound webhook event from the source platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub data: WebhookData,
    pub source: WebhookSource,
    #[serde(default)]
    pub timestamp: i64,
}

impl WebhookEvent {
    pub const PRODUCT_WRITTEN: &'static str = "product.written";
    pub const ORDER_PLACED: &'static str = "order.placed";

    /// Data category named by the event
    pub fn category(&self) -> Result<DataCategory> {
        match self.data.event.as_str() {
            Self::PRODUCT_WRITTEN => Ok(DataCategory::Product),
            Self::ORDER_PLACED => Ok(DataCategory::Order),
            other => Err(Error::validation(
                "data.event",
                format!("Unsupported event type: {}", other),
            )),
        }
    }

    /// Primary key of the payload entry for `category`
    ///
    /// When several entries match, the last one wins.
    pub fn source_identifier(&self, category: DataCategory) -> Result<String> {
        self.data
            .payload
            .iter()
            .rev()
            .find(|entry| entry.entity == category.entity_name() && !entry.primary_key.is_empty())
            .map(|entry| entry.primary_key.clone())
            .ok_or_else(|| {
                Error::validation("data.payload", "Could not determine source identifier")
            })
    }

    /// Source host with the scheme stripped, used to match a source connector
    pub fn source_domain(&self) -> &str {
        let url = self.source.url.trim();
        url.strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url)
            .trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(name: &str) -> WebhookEvent {
        serde_json::from_value(json!({
            "data": {
                "payload": [
                    {"entity": "product_translation", "operation": "update", "primaryKey": "t-1"},
                    {"entity": "product", "operation": "update", "primaryKey": "p-1",
                     "updatedFields": ["stock"], "versionId": "v-9"}
                ],
                "event": name
            },
            "source": {"url": "https://shop.example.test/", "eventId": "ev-1"},
            "timestamp": 1714000000
        }))
        .unwrap()
    }

    #[test]
    fn test_category_from_event_name() {
        assert_eq!(event("product.written").category().unwrap(), DataCategory::Product);
        assert_eq!(event("order.placed").category().unwrap(), DataCategory::Order);
        let err = event("customer.written").category().unwrap_err();
        assert!(err.to_string().contains("customer.written"));
    }

    #[test]
    fn test_source_identifier_matches_entity() {
        let event = event("product.written");
        assert_eq!(event.source_identifier(DataCategory::Product).unwrap(), "p-1");
        assert!(event.source_identifier(DataCategory::Order).is_err());
        assert_eq!(event.data.payload[1].version_id.as_deref(), Some("v-9"));
    }

    #[test]
    fn test_source_domain() {
        assert_eq!(event("product.written").source_domain(), "shop.example.test");
    }
}
