//! Field-mapping engine for rewriting source documents into destination documents
//!
//! A rule set is an ordered list of [`FieldMapping`](crate::FieldMapping)s. The
//! [`MappingPipeline`] resolves each rule's source path with the nested path
//! accessor, runs the rule's transformation through the
//! [`TransformDispatcher`], and writes the result into the destination tree.
//!
//! # Module Organization
//!
//! - [`types`] - Error taxonomy, transformation tags and config shapes
//! - [`path`] - Dot/bracket path accessor over JSON trees
//! - [`layout`] - Date layouts for the `format` transformation
//! - [`lookup`] - Entity lookup collaborator
//! - [`dispatcher`] - Per-value transformation dispatch
//! - [`pipeline`] - Rule application with required/default policy
//! - [`builder`] - Fluent builder API for field mappings
//! - [`built_in`] - Default product and order rule sets
//!
//! # Examples
//!
//! ```
//! use cartbridge_core::mapping::{FieldMappingBuilder, MappingPipeline};
//! use serde_json::json;
//!
//! let rule = FieldMappingBuilder::new("stock", "variants[0].inventoryQuantity")
//!     .transform("convert", r#"{"type": "int"}"#)
//!     .build()
//!     .unwrap();
//!
//! let pipeline = MappingPipeline::default().add_rule(rule);
//! let outcome = pipeline.transform(&json!({"stock": "12"}));
//!
//! assert_eq!(
//!     outcome.into_result().unwrap(),
//!     json!({"variants": [{"inventoryQuantity": 12}]})
//! );
//! ```
//!
//! Copyright (c) 2025 Cartbridge Team
//! Licensed under the Apache-2.0 license

// Core types and error definitions
pub mod types;

// Nested path accessor
pub mod path;

// Date layout translation
pub mod layout;

// Entity lookup collaborator
pub mod lookup;

// Per-value transformation dispatch
pub mod dispatcher;

// Rule application
pub mod pipeline;

// Rule builder API
pub mod builder;

// Pre-configured rule sets
pub mod built_in;


#[cfg(test)]
mod prop_tests;

pub use types::{
    value_to_string, ArrayMapConfig, ConditionOperator, ConditionRule, ConditionalConfig,
    ConvertConfig, ConvertTarget, EntityLookupConfig, FormatConfig, GidDirection,
    GraphqlIdConfig, JsonPathConfig, MapConfig, MappingError, MediaMapConfig, MetafieldConfig,
    TemplateConfig, TransformType, Transformation,
};

pub use builder::FieldMappingBuilder;
pub use dispatcher::{DispatchDefaults, TransformDispatcher};
pub use lookup::{EntityLookup, InMemoryEntityLookup, LookupError};
pub use path::{FieldPath, Segment};
pub use pipeline::{MappingPipeline, RuleFailure, TransformOutcome};
