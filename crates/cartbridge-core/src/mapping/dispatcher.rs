//! Transformation dispatcher
//!
//! Applies one field mapping's transformation to a single value. The stored
//! config blob is parsed on every application, so a rule with a malformed
//! config only fails when it is actually reached by a run.
//!
//! Copyright (c) 2025 Cartbridge Team
//! Licensed under the Apache-2.0 license

use super::layout::DateLayout;
use super::lookup::EntityLookup;
use super::path::FieldPath;
use super::types::{
    value_to_string, ArrayMapConfig, ConditionOperator, ConditionalConfig, ConvertTarget,
    EntityLookupConfig, FormatConfig, GidDirection, GraphqlIdConfig, MappingError, MapConfig,
    MediaMapConfig, MetafieldConfig, TemplateConfig, TransformType, Transformation,
};
use crate::types::FieldMapping;
use serde_json::{json, Map, Number, Value};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

type DispatchResult = std::result::Result<Value, MappingError>;

/// Fallbacks applied when a rule's config leaves a setting out
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchDefaults {
    /// Namespace for `graphql_id` configs that omit one
    pub graphql_namespace: String,
    /// Base URL for `media_map` configs with an empty `base_url`
    pub media_base_url: Option<String>,
}

impl Default for DispatchDefaults {
    fn default() -> Self {
        Self {
            graphql_namespace: GraphqlIdConfig::DEFAULT_NAMESPACE.to_string(),
            media_base_url: None,
        }
    }
}

/// Stateless per-value transformation engine
#[derive(Clone, Default)]
pub struct TransformDispatcher {
    lookup: Option<Arc<dyn EntityLookup>>,
    defaults: DispatchDefaults,
}

impl fmt::Debug for TransformDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformDispatcher")
            .field("lookup", &self.lookup.is_some())
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl TransformDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject the collaborator used by `entity_lookup`
    pub fn with_lookup(mut self, lookup: Arc<dyn EntityLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn with_defaults(mut self, defaults: DispatchDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &DispatchDefaults {
        &self.defaults
    }

    pub fn has_lookup(&self) -> bool {
        self.lookup.is_some()
    }

    /// Apply the rule's transformation to `value`
    pub fn apply(&self, value: &Value, rule: &FieldMapping) -> DispatchResult {
        let transformation = Transformation::parse(&rule.transform_type, &rule.transform_config)?;
        self.apply_transformation(value, &transformation)
    }

    /// Apply an already-parsed transformation
    pub fn apply_transformation(
        &self,
        value: &Value,
        transformation: &Transformation,
    ) -> DispatchResult {
        match transformation {
            Transformation::None => Ok(value.clone()),
            Transformation::Format(config) => format_date(value, config),
            Transformation::Convert(config) => convert(value, config.target),
            Transformation::Map(config) => map_value(value, config),
            Transformation::Template(config) => Ok(Value::String(
                config
                    .template
                    .replace(TemplateConfig::PLACEHOLDER, &value_to_string(value)),
            )),
            Transformation::GraphqlId(config) => self.graphql_id(value, config),
            Transformation::ArrayMap(config) => array_map(value, config),
            Transformation::JsonPath(config) => {
                if config.path.is_empty() {
                    return Ok(value.clone());
                }
                let path = FieldPath::parse(&config.path).map_err(|e| {
                    MappingError::invalid_config(TransformType::JsonPath, e.to_string())
                })?;
                path.get(value).cloned()
            }
            Transformation::Conditional(config) => Ok(conditional(value, config)),
            Transformation::MediaMap(config) => self.media_map(value, config),
            Transformation::Metafield(config) => Ok(metafield(value, config)),
            Transformation::EntityLookup(config) => self.entity_lookup(value, config),
        }
    }

    fn graphql_id(&self, value: &Value, config: &GraphqlIdConfig) -> DispatchResult {
        let id = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => {
                return Err(MappingError::conversion(
                    other,
                    "graphql id",
                    "value is not a string or number",
                ))
            }
        };

        match config.direction {
            GidDirection::ToGlobal => {
                if config.resource_type.is_empty() {
                    return Err(MappingError::invalid_config(
                        TransformType::GraphqlId,
                        "resource_type is required for to_global",
                    ));
                }
                let namespace = config
                    .namespace
                    .as_deref()
                    .unwrap_or(&self.defaults.graphql_namespace);
                Ok(Value::String(format!(
                    "gid://{}/{}/{}",
                    namespace, config.resource_type, id
                )))
            }
            GidDirection::FromGlobal => {
                let parts: Vec<&str> = id.split('/').collect();
                if parts.len() < 4 {
                    return Ok(value.clone());
                }
                Ok(Value::String(parts[parts.len() - 1].to_string()))
            }
        }
    }

    fn media_map(&self, value: &Value, config: &MediaMapConfig) -> DispatchResult {
        let Value::Array(items) = value else {
            return Err(MappingError::conversion(
                value,
                "media",
                "media value is not an array",
            ));
        };

        let base_url = if config.base_url.is_empty() {
            self.defaults.media_base_url.as_deref().unwrap_or("")
        } else {
            config.base_url.as_str()
        };

        let media = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let record = item.as_object()?;
                let url = non_null_string(record, "url").unwrap_or_default();
                let alt = non_null_string(record, "alt")
                    .filter(|alt| !alt.is_empty())
                    .or_else(|| non_null_string(record, "title"))
                    .unwrap_or_default();

                Some(json!({
                    "mediaContentType": "IMAGE",
                    "originalSource": absolute_url(base_url, &url),
                    "alt": alt,
                    "position": index + 1,
                }))
            })
            .collect();

        Ok(Value::Array(media))
    }

    fn entity_lookup(&self, value: &Value, config: &EntityLookupConfig) -> DispatchResult {
        let id = match value {
            Value::Null => String::new(),
            other => value_to_string(other),
        };
        if id.is_empty() {
            return Err(MappingError::conversion(value, "entity id", "empty entity ID"));
        }

        let Some(lookup) = &self.lookup else {
            warn!(
                entity_type = %config.entity_type,
                id = %id,
                "No entity lookup configured, keeping raw id"
            );
            return Ok(Value::String(id));
        };

        match lookup.lookup(&config.entity_type, &id, &config.property) {
            Ok(Some(resolved)) => {
                debug!(entity_type = %config.entity_type, id = %id, "Resolved entity");
                Ok(resolved)
            }
            Ok(None) => {
                warn!(
                    entity_type = %config.entity_type,
                    id = %id,
                    property = %config.property,
                    "Entity not resolved, keeping raw id"
                );
                Ok(Value::String(id))
            }
            Err(e) => {
                warn!(
                    entity_type = %config.entity_type,
                    id = %id,
                    error = %e,
                    "Entity lookup failed, keeping raw id"
                );
                Ok(Value::String(id))
            }
        }
    }
}

fn format_date(value: &Value, config: &FormatConfig) -> DispatchResult {
    let Value::String(input) = value else {
        return Err(MappingError::conversion(value, "date", "value is not a string"));
    };

    let source = DateLayout::compile(&config.source_format)
        .map_err(|e| MappingError::invalid_config(TransformType::Format, format!("source_format: {}", e)))?;
    let dest = DateLayout::compile(&config.dest_format)
        .map_err(|e| MappingError::invalid_config(TransformType::Format, format!("dest_format: {}", e)))?;

    let parsed = source
        .parse(input)
        .map_err(|e| MappingError::conversion(value, "date", e))?;
    dest.format(&parsed)
        .map(Value::String)
        .map_err(|e| MappingError::conversion(value, "date", e))
}

fn convert(value: &Value, target: ConvertTarget) -> DispatchResult {
    if target == ConvertTarget::String {
        return Ok(Value::String(value_to_string(value)));
    }

    let Value::String(input) = value else {
        return Err(MappingError::conversion(value, target.to_string(), "value is not a string"));
    };

    match target {
        ConvertTarget::Int => input
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| MappingError::conversion(value, "int", e.to_string())),
        ConvertTarget::Float => {
            let parsed = input
                .parse::<f64>()
                .map_err(|e| MappingError::conversion(value, "float", e.to_string()))?;
            Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| MappingError::conversion(value, "float", "not a finite number"))
        }
        ConvertTarget::Bool => parse_bool(input)
            .map(Value::Bool)
            .ok_or_else(|| MappingError::conversion(value, "bool", "invalid syntax")),
        ConvertTarget::String => Ok(Value::String(input.clone())),
    }
}

fn parse_bool(input: &str) -> Option<bool> {
    match input {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn map_value(value: &Value, config: &MapConfig) -> DispatchResult {
    let key = value_to_string(value);
    if let Some(mapped) = config.entries.get(&key) {
        return Ok(mapped.clone());
    }
    if let Some(default) = &config.default {
        return Ok(default.clone());
    }
    Err(MappingError::NoMappingMatch {
        value: key,
        available_mappings: config.entries.keys().cloned().collect(),
    })
}

fn array_map(value: &Value, config: &ArrayMapConfig) -> DispatchResult {
    let parse = |path: &str| -> Result<Option<FieldPath>, MappingError> {
        if path.is_empty() {
            return Ok(None);
        }
        FieldPath::parse(path)
            .map(Some)
            .map_err(|e| MappingError::invalid_config(TransformType::ArrayMap, e.to_string()))
    };
    let source_path = parse(&config.source_path)?;
    let dest_path = parse(&config.dest_path)?;

    let project = |item: &Map<String, Value>| -> DispatchResult {
        let item = Value::Object(item.clone());
        let source_value = match &source_path {
            None => item.clone(),
            Some(path) => match path.get_leaf(&item) {
                Ok(Some(found)) => found.clone(),
                Ok(None) => Value::Null,
                Err(_) => return Ok(Value::Object(Map::new())),
            },
        };

        let Some(dest_path) = &dest_path else {
            return Ok(item);
        };

        let remapped = match (&config.mapping, source_value.as_str()) {
            (Some(table), Some(s)) => table.get(s).map(|m| Value::String(m.clone())),
            _ => None,
        };
        let mapped = remapped.unwrap_or(source_value);

        let mut projected = Value::Object(Map::new());
        dest_path.set(&mut projected, mapped)?;
        Ok(projected)
    };

    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .map(&project)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(item) => Ok(Value::Array(vec![project(item)?])),
        other => Err(MappingError::conversion(
            other,
            "array",
            "value is not an array or object",
        )),
    }
}

fn conditional(value: &Value, config: &ConditionalConfig) -> Value {
    config
        .conditions
        .iter()
        .find(|rule| condition_matches(rule.operator, value, &rule.value))
        .map(|rule| rule.result.clone())
        .or_else(|| config.default.clone())
        .unwrap_or_else(|| value.clone())
}

fn condition_matches(operator: ConditionOperator, value: &Value, operand: &Value) -> bool {
    match operator {
        ConditionOperator::Equals => loosely_equal(value, operand),
        ConditionOperator::Contains => match value {
            Value::String(s) => s.contains(value_to_string(operand).as_str()),
            Value::Array(items) => items.iter().any(|item| loosely_equal(item, operand)),
            _ => false,
        },
        ConditionOperator::GreaterThan => {
            compare_numeric(value, operand) == Some(Ordering::Greater)
        }
        ConditionOperator::LessThan => compare_numeric(value, operand) == Some(Ordering::Less),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (as_number(left), as_number(right)) {
        (Some(a), Some(b)) => a == b,
        _ => value_to_string(left) == value_to_string(right),
    }
}

fn compare_numeric(left: &Value, right: &Value) -> Option<Ordering> {
    as_number(left)?.partial_cmp(&as_number(right)?)
}

fn metafield(value: &Value, config: &MetafieldConfig) -> Value {
    let value_type = if config.value_type.is_empty() {
        "string"
    } else {
        config.value_type.as_str()
    };

    let coerced = match value_type {
        "number_integer" => Value::from(metafield_integer(value).unwrap_or(0)),
        "number_decimal" => {
            let decimal = match value {
                Value::Number(n) => n.as_f64(),
                other => value_to_string(other).parse::<f64>().ok(),
            };
            decimal
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| json!(0.0))
        }
        "boolean" => {
            let flag = value_to_string(value).to_lowercase();
            Value::Bool(matches!(flag.as_str(), "true" | "1" | "yes"))
        }
        "json_string" => Value::String(value.to_string()),
        _ => Value::String(value_to_string(value)),
    };

    json!({
        "namespace": config.namespace,
        "key": config.key,
        "value": coerced,
        "type": value_type,
    })
}

fn metafield_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        other => value_to_string(other).parse::<i64>().ok(),
    }
}

fn non_null_string(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value_to_string(value)),
    }
}

fn absolute_url(base_url: &str, url: &str) -> String {
    let lowered = url.to_ascii_lowercase();
    if base_url.is_empty() || lowered.starts_with("http://") || lowered.starts_with("https://") {
        return url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}
