//! Migration log records and their status machine
//!
//! A log is created `pending` at ingestion, moves to `in_progress` once handed
//! to the orchestrator, and ends `success` or `failed`. A failed handoff moves
//! it straight from `pending` to `failed`. Terminal states are never left.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Errors raised by status transitions and log bookkeeping
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("Migration {migration_id}: invalid transition from {from} to {to}")]
    InvalidTransition {
        migration_id: u64,
        from: MigrationStatus,
        to: MigrationStatus,
    },

    #[error("Migration log {migration_id} not found")]
    MigrationNotFound { migration_id: u64 },

    #[error("Dataflow {dataflow_id} is referenced by {log_count} migration log(s)")]
    DataflowInUse { dataflow_id: u64, log_count: usize },

    #[error("Handoff to orchestrator failed: {message}")]
    HandoffFailed { message: String },

    #[error("Migration {migration_id} is already {status}")]
    Finalized {
        migration_id: u64,
        status: MigrationStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    #[default]
    Pending,
    InProgress,
    Success,
    Failed,
}

impl MigrationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MigrationStatus::Success | MigrationStatus::Failed)
    }

    /// Whether `self -> next` is an allowed edge
    pub fn can_transition_to(&self, next: MigrationStatus) -> bool {
        use MigrationStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (Pending, Failed) | (InProgress, Success) | (InProgress, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStatus::Pending => "pending",
            MigrationStatus::InProgress => "in_progress",
            MigrationStatus::Success => "success",
            MigrationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row per (dataflow, triggering event)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationLog {
    pub id: u64,
    pub dataflow_id: u64,
    pub status: MigrationStatus,
    /// Record id in the source system
    pub source_identifier: String,
    /// Record id in the destination system, set by a success callback
    pub dest_identifier: Option<String>,
    /// Opaque handle of the orchestrator run
    pub execution_handle: Option<String>,
    pub source_payload: Value,
    pub transformed_payload: Option<Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl MigrationLog {
    /// A fresh `pending` log; the store assigns the id on insert
    pub fn new(dataflow_id: u64, source_identifier: impl Into<String>, source_payload: Value) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            dataflow_id,
            status: MigrationStatus::Pending,
            source_identifier: source_identifier.into(),
            dest_identifier: None,
            execution_handle: None,
            source_payload,
            transformed_payload: None,
            error_message: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    fn transition(&mut self, next: MigrationStatus) -> Result<(), LifecycleError> {
        if !self.status.can_transition_to(next) {
            return Err(LifecycleError::InvalidTransition {
                migration_id: self.id,
                from: self.status,
                to: next,
            });
        }
        let now = Utc::now();
        self.status = next;
        self.updated_at = now;
        if next.is_terminal() {
            self.completed_at = Some(now);
        }
        Ok(())
    }

    /// pending -> in_progress after a successful handoff
    pub fn mark_in_progress(&mut self, handle: impl Into<String>) -> Result<(), LifecycleError> {
        self.transition(MigrationStatus::InProgress)?;
        self.execution_handle = Some(handle.into());
        Ok(())
    }

    /// Move to `failed`, recording the error verbatim
    pub fn mark_failed(&mut self, message: impl Into<String>) -> Result<(), LifecycleError> {
        self.transition(MigrationStatus::Failed)?;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// in_progress -> success
    pub fn mark_succeeded(&mut self, dest_identifier: Option<String>) -> Result<(), LifecycleError> {
        self.transition(MigrationStatus::Success)?;
        if dest_identifier.is_some() {
            self.dest_identifier = dest_identifier;
        }
        Ok(())
    }

    /// Store the transformed snapshot; refused once the log is terminal
    pub fn record_transformed(&mut self, payload: Value) -> Result<(), LifecycleError> {
        if self.status.is_terminal() {
            return Err(LifecycleError::Finalized {
                migration_id: self.id,
                status: self.status,
            });
        }
        self.transformed_payload = Some(payload);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Apply an orchestrator status callback
    pub fn apply_callback(&mut self, callback: &StatusCallback) -> Result<(), LifecycleError> {
        if !callback.status.is_terminal() {
            return Err(LifecycleError::InvalidTransition {
                migration_id: self.id,
                from: self.status,
                to: callback.status,
            });
        }

        // Validate before touching any field
        if !self.status.can_transition_to(callback.status) {
            return Err(LifecycleError::InvalidTransition {
                migration_id: self.id,
                from: self.status,
                to: callback.status,
            });
        }

        if let Some(transformed) = &callback.transformed_data {
            self.transformed_payload = Some(transformed.clone());
        }

        match callback.status {
            MigrationStatus::Success => self.mark_succeeded(callback.dest_identifier.clone()),
            _ => self.mark_failed(
                callback
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "orchestrator reported failure".to_string()),
            ),
        }
    }
}

/// Input of one orchestrator run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffRequest {
    pub dataflow_id: u64,
    pub migration_id: u64,
    pub source_data: Value,
}

/// Asynchronous status report from the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCallback {
    pub migration_id: u64,
    pub status: MigrationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformed_data: Option<Value>,
}

impl StatusCallback {
    pub fn success(migration_id: u64, dest_identifier: impl Into<String>) -> Self {
        Self {
            migration_id,
            status: MigrationStatus::Success,
            dest_identifier: Some(dest_identifier.into()),
            error_message: None,
            transformed_data: None,
        }
    }

    pub fn failure(migration_id: u64, error_message: impl Into<String>) -> Self {
        Self {
            migration_id,
            status: MigrationStatus::Failed,
            dest_identifier: None,
            error_message: Some(error_message.into()),
            transformed_data: None,
        }
    }
}
