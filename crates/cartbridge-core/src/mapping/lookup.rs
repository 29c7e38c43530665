//! Entity lookup collaborator for the `entity_lookup` transformation
//!
//! The pipeline never talks to a database directly. Callers inject an
//! [`EntityLookup`] that resolves `(entity_type, id, property)` against
//! whatever side table they own; [`InMemoryEntityLookup`] serves tests and
//! the CLI.
//!
//! Copyright (c) 2025 Cartbridge Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Failure of the lookup backend itself (not a miss)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("Lookup backend unavailable: {message}")]
    Unavailable { message: String },

    #[error("Unsupported entity type: {entity_type}")]
    UnsupportedEntityType { entity_type: String },
}

/// Point lookups against an external side table
pub trait EntityLookup: Send + Sync {
    /// Returns `Ok(None)` when the entity or the property does not exist
    fn lookup(
        &self,
        entity_type: &str,
        id: &str,
        property: &str,
    ) -> Result<Option<Value>, LookupError>;
}

/// Side tables held in memory: entity type -> id -> record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryEntityLookup {
    tables: HashMap<String, HashMap<String, Map<String, Value>>>,
}

impl InMemoryEntityLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one record
    pub fn insert(
        &mut self,
        entity_type: impl Into<String>,
        id: impl Into<String>,
        record: Map<String, Value>,
    ) {
        self.tables
            .entry(entity_type.into())
            .or_default()
            .insert(id.into(), record);
    }

    /// Builder-style variant of [`insert`](Self::insert) taking a JSON object
    pub fn with_record(mut self, entity_type: &str, id: &str, record: Value) -> Self {
        if let Value::Object(record) = record {
            self.insert(entity_type, id, record);
        }
        self
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntityLookup for InMemoryEntityLookup {
    fn lookup(
        &self,
        entity_type: &str,
        id: &str,
        property: &str,
    ) -> Result<Option<Value>, LookupError> {
        let Some(table) = self.tables.get(entity_type) else {
            return Err(LookupError::UnsupportedEntityType {
                entity_type: entity_type.to_string(),
            });
        };

        Ok(table
            .get(id)
            .and_then(|record| record.get(property))
            .cloned())
    }
}
