//! Mapping pipeline implementation
//!
//! Drives an ordered rule set over one source document. Each rule resolves its
//! source path, falls back to its default or is skipped when the source is
//! absent, runs the dispatcher, and writes into the destination tree. The first
//! failing rule ends the run; rules after it are never evaluated.
//!
//! Copyright (c) 2025 Cartbridge Team
//! Licensed under the Apache-2.0 license

use super::dispatcher::{DispatchDefaults, TransformDispatcher};
use super::lookup::EntityLookup;
use super::path::{self, FieldPath};
use super::types::{MappingError, Transformation};
use crate::types::{Dataflow, FieldMapping};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

/// The rule that ended a run and why
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error} (rule {rule_index}: {source_field} -> {dest_field})")]
pub struct RuleFailure {
    /// Position of the rule in the rule set
    pub rule_index: usize,
    pub source_field: String,
    pub dest_field: String,
    #[source]
    pub error: MappingError,
}

impl RuleFailure {
    fn new(rule_index: usize, rule: &FieldMapping, error: MappingError) -> Self {
        Self {
            rule_index,
            source_field: rule.source_field.clone(),
            dest_field: rule.dest_field.clone(),
            error,
        }
    }
}

/// Result of one run: the destination tree built so far plus the terminal failure
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutcome {
    pub document: Value,
    pub failure: Option<RuleFailure>,
    /// Rules that wrote into the destination
    pub applied: usize,
    /// Optional rules whose source was absent and had no default
    pub skipped: usize,
}

impl TransformOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// The finished document, or the failure that aborted the run
    pub fn into_result(self) -> std::result::Result<Value, RuleFailure> {
        match self.failure {
            None => Ok(self.document),
            Some(failure) => Err(failure),
        }
    }
}

/// An ordered rule set bound to a dispatcher
#[derive(Debug, Clone, Default)]
pub struct MappingPipeline {
    rules: Vec<FieldMapping>,
    dispatcher: TransformDispatcher,
}

impl MappingPipeline {
    /// Create a pipeline over `rules`, applied in the given order
    pub fn new(rules: Vec<FieldMapping>) -> Self {
        Self {
            rules,
            dispatcher: TransformDispatcher::new(),
        }
    }

    /// Create a pipeline over a dataflow's rule set
    pub fn for_dataflow(dataflow: &Dataflow) -> Self {
        Self::new(dataflow.field_mappings.clone())
    }

    /// Inject the collaborator used by `entity_lookup` rules
    pub fn with_lookup(mut self, lookup: Arc<dyn EntityLookup>) -> Self {
        self.dispatcher = self.dispatcher.with_lookup(lookup);
        self
    }

    pub fn with_defaults(mut self, defaults: DispatchDefaults) -> Self {
        self.dispatcher = self.dispatcher.with_defaults(defaults);
        self
    }

    /// Append a rule at the end of the rule set
    pub fn add_rule(mut self, rule: FieldMapping) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append several rules, keeping their order
    pub fn add_rules<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = FieldMapping>,
    {
        self.rules.extend(rules);
        self
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> &[FieldMapping] {
        &self.rules
    }

    pub fn dispatcher(&self) -> &TransformDispatcher {
        &self.dispatcher
    }

    /// Run every rule against `source` in order, stopping at the first failure
    #[instrument(skip_all, fields(rules = self.rules.len()))]
    pub fn transform(&self, source: &Value) -> TransformOutcome {
        let mut outcome = TransformOutcome {
            document: Value::Object(Map::new()),
            failure: None,
            applied: 0,
            skipped: 0,
        };

        for (index, rule) in self.rules.iter().enumerate() {
            match self.apply_rule(source, rule, &mut outcome.document) {
                Ok(true) => outcome.applied += 1,
                Ok(false) => outcome.skipped += 1,
                Err(error) => {
                    let failure = RuleFailure::new(index, rule, error);
                    warn!(
                        rule_index = index,
                        source_field = %rule.source_field,
                        kind = failure.error.kind(),
                        "Transformation aborted: {}",
                        failure.error
                    );
                    outcome.failure = Some(failure);
                    return outcome;
                }
            }
        }

        debug!(
            applied = outcome.applied,
            skipped = outcome.skipped,
            "Transformation completed"
        );
        outcome
    }

    /// Returns `Ok(false)` when the rule was skipped
    fn apply_rule(
        &self,
        source: &Value,
        rule: &FieldMapping,
        document: &mut Value,
    ) -> std::result::Result<bool, MappingError> {
        let input = match path::lookup(source, &rule.source_field) {
            Some(found) => found.clone(),
            None if rule.is_required => {
                return Err(MappingError::RequiredFieldMissing {
                    field: rule.source_field.clone(),
                })
            }
            None if !rule.default_value.is_empty() => {
                trace!(source_field = %rule.source_field, "Using default value");
                Value::String(rule.default_value.clone())
            }
            None => {
                trace!(source_field = %rule.source_field, "Source absent, skipping rule");
                return Ok(false);
            }
        };

        let transformed = self.dispatcher.apply(&input, rule)?;
        path::set(document, &rule.dest_field, transformed)?;

        debug!(
            source_field = %rule.source_field,
            dest_field = %rule.dest_field,
            transform_type = %rule.transform_type,
            "Applied rule"
        );
        Ok(true)
    }

    /// Check every rule's paths and config up front and report all problems
    ///
    /// `transform` never calls this; a run only fails on the rules it reaches.
    pub fn validate_rules(&self) -> Vec<RuleFailure> {
        let mut problems = Vec::new();

        for (index, rule) in self.rules.iter().enumerate() {
            for field in [&rule.source_field, &rule.dest_field] {
                if let Err(error) = FieldPath::parse(field) {
                    problems.push(RuleFailure::new(index, rule, error));
                }
            }
            if let Err(error) = Transformation::parse(&rule.transform_type, &rule.transform_config)
            {
                problems.push(RuleFailure::new(index, rule, error));
            }
        }

        problems
    }
}
