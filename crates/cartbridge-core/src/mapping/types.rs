//! Core types for the field-mapping engine
//!
//! This module defines the error taxonomy raised while resolving paths and
//! applying transformations, the closed set of transformation tags stored on
//! each field mapping, and the strongly-typed configuration shape of every
//! transformation variant.
//!
//! Copyright (c) 2025 Cartbridge Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while resolving paths or transforming values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    /// A path segment did not resolve to an existing key
    #[error("Path not found: '{segment}' in {path}")]
    PathNotFound { path: String, segment: String },

    /// An indexed segment pointed past the end of a sequence
    #[error("Array index out of bounds: {index} (length {len}) in {path}")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    /// An existing value has the wrong shape for the requested assignment
    #[error("Shape conflict at '{segment}' in {path}: expected {expected}, found {found}")]
    ShapeConflict {
        path: String,
        segment: String,
        expected: String,
        found: String,
    },

    /// The path expression itself is malformed
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The transform config does not match the declared transform type
    #[error("Invalid transform config for '{transform_type}': {message}")]
    InvalidConfig {
        transform_type: String,
        message: String,
    },

    /// A value could not be coerced to the requested type
    #[error("Conversion failed: cannot convert {value} to {target}: {message}")]
    ConversionError {
        value: String,
        target: String,
        message: String,
    },

    /// A lookup table had neither a matching key nor a `_default`
    #[error("No mapping found for value: {value}")]
    NoMappingMatch {
        value: String,
        available_mappings: Vec<String>,
    },

    /// The stored transform tag is not one the engine knows
    #[error("Unsupported transformation type: {transform_type}")]
    UnsupportedTransformType { transform_type: String },

    /// A required source field was absent
    #[error("Required field {field} not found in source data")]
    RequiredFieldMissing { field: String },
}

impl MappingError {
    /// Stable snake_case code for logs and machine-readable output
    pub fn kind(&self) -> &'static str {
        match self {
            MappingError::PathNotFound { .. } => "path_not_found",
            MappingError::IndexOutOfBounds { .. } => "index_out_of_bounds",
            MappingError::ShapeConflict { .. } => "shape_conflict",
            MappingError::InvalidPath { .. } => "invalid_path",
            MappingError::InvalidConfig { .. } => "invalid_config",
            MappingError::ConversionError { .. } => "conversion_error",
            MappingError::NoMappingMatch { .. } => "no_mapping_match",
            MappingError::UnsupportedTransformType { .. } => "unsupported_transform_type",
            MappingError::RequiredFieldMissing { .. } => "required_field_missing",
        }
    }

    /// Whether a failed `get` should be treated as "not found" by the pipeline
    pub fn is_recoverable_lookup(&self) -> bool {
        matches!(
            self,
            MappingError::PathNotFound { .. }
                | MappingError::IndexOutOfBounds { .. }
                | MappingError::InvalidPath { .. }
        )
    }

    pub(crate) fn invalid_config(transform_type: TransformType, message: impl Into<String>) -> Self {
        MappingError::InvalidConfig {
            transform_type: transform_type.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn conversion(
        value: &Value,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MappingError::ConversionError {
            value: value_to_string(value),
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Transformation tag stored on a field mapping
///
/// Unknown tags survive deserialization as [`TransformType::Unsupported`] so
/// that a stored rule with a foreign tag fails when it is applied, not when
/// the rule set is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransformType {
    #[default]
    None,
    Format,
    Convert,
    Map,
    Template,
    GraphqlId,
    ArrayMap,
    JsonPath,
    Conditional,
    MediaMap,
    Metafield,
    EntityLookup,
    Unsupported(String),
}

impl TransformType {
    /// Every supported tag, in declaration order
    pub const SUPPORTED: [TransformType; 12] = [
        TransformType::None,
        TransformType::Format,
        TransformType::Convert,
        TransformType::Map,
        TransformType::Template,
        TransformType::GraphqlId,
        TransformType::ArrayMap,
        TransformType::JsonPath,
        TransformType::Conditional,
        TransformType::MediaMap,
        TransformType::Metafield,
        TransformType::EntityLookup,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TransformType::None => "none",
            TransformType::Format => "format",
            TransformType::Convert => "convert",
            TransformType::Map => "map",
            TransformType::Template => "template",
            TransformType::GraphqlId => "graphql_id",
            TransformType::ArrayMap => "array_map",
            TransformType::JsonPath => "json_path",
            TransformType::Conditional => "conditional",
            TransformType::MediaMap => "media_map",
            TransformType::Metafield => "metafield",
            TransformType::EntityLookup => "entity_lookup",
            TransformType::Unsupported(tag) => tag,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, TransformType::Unsupported(_))
    }
}

impl From<String> for TransformType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            // Rows persisted without a tag were created as direct mappings
            "" | "none" => TransformType::None,
            "format" => TransformType::Format,
            "convert" => TransformType::Convert,
            "map" => TransformType::Map,
            "template" => TransformType::Template,
            "graphql_id" => TransformType::GraphqlId,
            "array_map" => TransformType::ArrayMap,
            "json_path" => TransformType::JsonPath,
            "conditional" => TransformType::Conditional,
            "media_map" => TransformType::MediaMap,
            "metafield" => TransformType::Metafield,
            "entity_lookup" => TransformType::EntityLookup,
            _ => TransformType::Unsupported(tag),
        }
    }
}

impl From<&str> for TransformType {
    fn from(tag: &str) -> Self {
        TransformType::from(tag.to_string())
    }
}

impl From<TransformType> for String {
    fn from(tag: TransformType) -> Self {
        tag.as_str().to_string()
    }
}

impl fmt::Display for TransformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Config for `format`: reparse a date string and render it in another layout
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FormatConfig {
    pub source_format: String,
    pub dest_format: String,
}

/// Target scalar type for `convert`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvertTarget {
    String,
    Int,
    Float,
    Bool,
}

impl fmt::Display for ConvertTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertTarget::String => write!(f, "string"),
            ConvertTarget::Int => write!(f, "int"),
            ConvertTarget::Float => write!(f, "float"),
            ConvertTarget::Bool => write!(f, "bool"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConvertConfig {
    #[serde(rename = "type")]
    pub target: ConvertTarget,
}

/// Config for `map`: a lookup table with an optional `_default` fallback
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub entries: Map<String, Value>,
    pub default: Option<Value>,
}

impl MapConfig {
    pub const DEFAULT_KEY: &'static str = "_default";

    pub(crate) fn from_table(mut entries: Map<String, Value>) -> Self {
        let default = entries.remove(Self::DEFAULT_KEY);
        Self { entries, default }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TemplateConfig {
    pub template: String,
}

impl TemplateConfig {
    pub const PLACEHOLDER: &'static str = "{{value}}";
}

/// Direction of a `graphql_id` conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GidDirection {
    ToGlobal,
    FromGlobal,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GraphqlIdConfig {
    #[serde(default)]
    pub resource_type: String,
    pub direction: GidDirection,
    /// Falls back to the dispatcher's namespace when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl GraphqlIdConfig {
    pub const DEFAULT_NAMESPACE: &'static str = "shopify";
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ArrayMapConfig {
    #[serde(default)]
    pub source_path: String,
    #[serde(default)]
    pub dest_path: String,
    #[serde(default)]
    pub mapping: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JsonPathConfig {
    pub path: String,
}

/// Comparison operator of a conditional branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    Contains,
    GreaterThan,
    LessThan,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConditionRule {
    pub operator: ConditionOperator,
    pub value: Value,
    pub result: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ConditionalConfig {
    #[serde(default)]
    pub conditions: Vec<ConditionRule>,
    #[serde(default)]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct MediaMapConfig {
    #[serde(default)]
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MetafieldConfig {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub key: String,
    #[serde(default, rename = "type")]
    pub value_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EntityLookupConfig {
    pub entity_type: String,
    #[serde(default)]
    pub property: String,
}

/// A transformation with its config parsed into the variant's shape
#[derive(Debug, Clone, PartialEq)]
pub enum Transformation {
    None,
    Format(FormatConfig),
    Convert(ConvertConfig),
    Map(MapConfig),
    Template(TemplateConfig),
    GraphqlId(GraphqlIdConfig),
    ArrayMap(ArrayMapConfig),
    JsonPath(JsonPathConfig),
    Conditional(ConditionalConfig),
    MediaMap(MediaMapConfig),
    Metafield(MetafieldConfig),
    EntityLookup(EntityLookupConfig),
}

impl Transformation {
    /// Parse a stored config blob against the declared transform type
    pub fn parse(transform_type: &TransformType, config: &str) -> Result<Self, MappingError> {
        let parsed = match transform_type {
            TransformType::None => Transformation::None,
            TransformType::Format => Transformation::Format(parse_config(transform_type, config)?),
            TransformType::Convert => Transformation::Convert(parse_config(transform_type, config)?),
            TransformType::Map => {
                let table: Map<String, Value> = parse_config(transform_type, config)?;
                Transformation::Map(MapConfig::from_table(table))
            }
            TransformType::Template => Transformation::Template(parse_config(transform_type, config)?),
            TransformType::GraphqlId => Transformation::GraphqlId(parse_config(transform_type, config)?),
            TransformType::ArrayMap => Transformation::ArrayMap(parse_config(transform_type, config)?),
            TransformType::JsonPath => Transformation::JsonPath(parse_config(transform_type, config)?),
            TransformType::Conditional => {
                Transformation::Conditional(parse_config(transform_type, config)?)
            }
            TransformType::MediaMap => Transformation::MediaMap(parse_config(transform_type, config)?),
            TransformType::Metafield => {
                let metafield: MetafieldConfig = parse_config(transform_type, config)?;
                if metafield.namespace.is_empty() || metafield.key.is_empty() {
                    return Err(MappingError::invalid_config(
                        transform_type.clone(),
                        "metafield namespace and key are required",
                    ));
                }
                Transformation::Metafield(metafield)
            }
            TransformType::EntityLookup => {
                Transformation::EntityLookup(parse_config(transform_type, config)?)
            }
            TransformType::Unsupported(tag) => {
                return Err(MappingError::UnsupportedTransformType {
                    transform_type: tag.clone(),
                })
            }
        };
        Ok(parsed)
    }

    /// The tag this transformation was parsed from
    pub fn transform_type(&self) -> TransformType {
        match self {
            Transformation::None => TransformType::None,
            Transformation::Format(_) => TransformType::Format,
            Transformation::Convert(_) => TransformType::Convert,
            Transformation::Map(_) => TransformType::Map,
            Transformation::Template(_) => TransformType::Template,
            Transformation::GraphqlId(_) => TransformType::GraphqlId,
            Transformation::ArrayMap(_) => TransformType::ArrayMap,
            Transformation::JsonPath(_) => TransformType::JsonPath,
            Transformation::Conditional(_) => TransformType::Conditional,
            Transformation::MediaMap(_) => TransformType::MediaMap,
            Transformation::Metafield(_) => TransformType::Metafield,
            Transformation::EntityLookup(_) => TransformType::EntityLookup,
        }
    }
}

fn parse_config<T>(transform_type: &TransformType, config: &str) -> Result<T, MappingError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(config)
        .map_err(|e| MappingError::invalid_config(transform_type.clone(), e.to_string()))
}

/// Canonical string representation of a value
///
/// Strings render raw, scalars through `Display`, `null` as `null`, and
/// containers as compact JSON. Lookup keys, templates and string coercion all
/// go through this one function.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
