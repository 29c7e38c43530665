//! Builder for creating field mappings
//!
//! This module provides a fluent builder API for constructing field mappings
//! with optional transformation and required/default policy.
//!
//! Copyright (c) 2025 Cartbridge Team
//! Licensed under the Apache-2.0 license

use super::types::TransformType;
use crate::types::FieldMapping;
use crate::Result;

/// Builder for creating field mappings
#[derive(Debug, Clone)]
pub struct FieldMappingBuilder {
    source_field: String,
    dest_field: String,
    is_required: bool,
    default_value: String,
    transform_type: TransformType,
    transform_config: String,
    dataflow_id: Option<u64>,
}

impl FieldMappingBuilder {
    /// Create a new builder copying `source_field` into `dest_field`
    pub fn new(source_field: impl Into<String>, dest_field: impl Into<String>) -> Self {
        Self {
            source_field: source_field.into(),
            dest_field: dest_field.into(),
            is_required: false,
            default_value: String::new(),
            transform_type: TransformType::None,
            transform_config: String::new(),
            dataflow_id: None,
        }
    }

    /// Abort the run when the source field is absent
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Value substituted when the source field is absent
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Set the transformation and its JSON config
    pub fn transform(mut self, transform_type: impl Into<TransformType>, config: impl Into<String>) -> Self {
        self.transform_type = transform_type.into();
        self.transform_config = config.into();
        self
    }

    /// Attach the rule to a dataflow
    pub fn dataflow(mut self, dataflow_id: u64) -> Self {
        self.dataflow_id = Some(dataflow_id);
        self
    }

    /// Build the field mapping
    ///
    /// Only the paths are checked; the config is interpreted when the rule runs.
    pub fn build(self) -> Result<FieldMapping> {
        let mapping = FieldMapping {
            id: None,
            dataflow_id: self.dataflow_id,
            source_field: self.source_field,
            dest_field: self.dest_field,
            is_required: self.is_required,
            default_value: self.default_value,
            transform_type: self.transform_type,
            transform_config: self.transform_config,
        };
        mapping.validate()?;
        Ok(mapping)
    }
}
