//! Built-in rule sets for common migrations
//!
//! These are the default Shopware to Shopify rule sets offered when a dataflow
//! is created without custom mappings.
//!
//! Copyright (c) 2025 Cartbridge Team
//! Licensed under the Apache-2.0 license

use super::types::TransformType;
use crate::types::{DataCategory, FieldMapping};

fn rule(
    source_field: &str,
    dest_field: &str,
    is_required: bool,
    transform_type: TransformType,
    transform_config: &str,
) -> FieldMapping {
    FieldMapping {
        id: None,
        dataflow_id: None,
        source_field: source_field.to_string(),
        dest_field: dest_field.to_string(),
        is_required,
        default_value: String::new(),
        transform_type,
        transform_config: transform_config.to_string(),
    }
}

fn direct(source_field: &str, dest_field: &str, is_required: bool) -> FieldMapping {
    rule(source_field, dest_field, is_required, TransformType::None, "")
}

/// Default product rule set
pub fn default_product_mappings() -> Vec<FieldMapping> {
    let mut status = rule(
        "active",
        "status",
        false,
        TransformType::Map,
        r#"{"true": "ACTIVE", "false": "DRAFT", "_default": "DRAFT"}"#,
    );
    status.default_value = "ACTIVE".to_string();

    vec![
        rule(
            "id",
            "id",
            true,
            TransformType::GraphqlId,
            r#"{"resource_type": "Product", "direction": "to_global"}"#,
        ),
        direct("name", "title", true),
        direct("description", "descriptionHtml", false),
        direct("productNumber", "variants[0].sku", false),
        rule(
            "stock",
            "variants[0].inventoryQuantity",
            false,
            TransformType::Convert,
            r#"{"type": "int"}"#,
        ),
        rule(
            "price[0].gross",
            "variants[0].price",
            true,
            TransformType::Convert,
            r#"{"type": "string"}"#,
        ),
        status,
        rule(
            "manufacturerId",
            "vendor",
            false,
            TransformType::EntityLookup,
            r#"{"entity_type": "manufacturer", "property": "name"}"#,
        ),
        rule(
            "categoryIds",
            "collections",
            false,
            TransformType::ArrayMap,
            r#"{"source_path": "id", "dest_path": "id"}"#,
        ),
        rule(
            "media",
            "media",
            false,
            TransformType::MediaMap,
            r#"{"base_url": ""}"#,
        ),
        direct("metaTitle", "seo.title", false),
        direct("metaDescription", "seo.description", false),
        rule(
            "weight",
            "variants[0].weight",
            false,
            TransformType::Convert,
            r#"{"type": "float"}"#,
        ),
        rule(
            "width",
            "metafields[0]",
            false,
            TransformType::Metafield,
            r#"{"namespace": "dimensions", "key": "width", "type": "number_decimal"}"#,
        ),
        rule(
            "height",
            "metafields[1]",
            false,
            TransformType::Metafield,
            r#"{"namespace": "dimensions", "key": "height", "type": "number_decimal"}"#,
        ),
        rule(
            "length",
            "metafields[2]",
            false,
            TransformType::Metafield,
            r#"{"namespace": "dimensions", "key": "length", "type": "number_decimal"}"#,
        ),
    ]
}

/// Default order rule set
pub fn default_order_mappings() -> Vec<FieldMapping> {
    let mut rules = vec![
        rule(
            "id",
            "id",
            true,
            TransformType::GraphqlId,
            r#"{"resource_type": "Order", "direction": "to_global"}"#,
        ),
        rule(
            "orderNumber",
            "name",
            true,
            TransformType::Template,
            r##"{"template": "#{{value}}"}"##,
        ),
        direct("orderCustomer.email", "email", false),
        direct("orderCustomer.firstName", "customer.firstName", false),
        direct("orderCustomer.lastName", "customer.lastName", false),
    ];

    for (source, dest) in [("billingAddress", "billingAddress"), ("shippingAddress", "shippingAddress")] {
        rules.push(direct(&format!("{}.street", source), &format!("{}.address1", dest), false));
        rules.push(direct(&format!("{}.city", source), &format!("{}.city", dest), false));
        rules.push(direct(&format!("{}.zipcode", source), &format!("{}.zip", dest), false));
        rules.push(rule(
            &format!("{}.countryId", source),
            &format!("{}.countryCode", dest),
            false,
            TransformType::EntityLookup,
            r#"{"entity_type": "country", "property": "iso"}"#,
        ));
    }

    rules.extend([
        rule(
            "lineItems",
            "lineItems",
            false,
            TransformType::ArrayMap,
            r#"{"source_path": "productId", "dest_path": "variant.id"}"#,
        ),
        rule(
            "amountTotal",
            "totalPrice",
            true,
            TransformType::Convert,
            r#"{"type": "string"}"#,
        ),
        rule(
            "stateMachineState.technicalName",
            "financialStatus",
            false,
            TransformType::Map,
            r#"{"open": "PENDING", "paid": "PAID", "refunded": "REFUNDED", "cancelled": "VOIDED", "_default": "PENDING"}"#,
        ),
        rule(
            "createdAt",
            "processedAt",
            false,
            TransformType::Format,
            r#"{"source_format": "2006-01-02T15:04:05.000-07:00", "dest_format": "2006-01-02T15:04:05Z07:00"}"#,
        ),
    ]);

    rules
}

/// Default rule set for a data category, tagged with `dataflow_id`
pub fn default_mappings(category: DataCategory, dataflow_id: Option<u64>) -> Vec<FieldMapping> {
    let mut rules = match category {
        DataCategory::Product => default_product_mappings(),
        DataCategory::Order => default_order_mappings(),
    };
    for rule in &mut rules {
        rule.dataflow_id = dataflow_id;
    }
    rules
}
