//! Hand-off to the external workflow orchestrator
//!
//! The orchestrator sequences "transform, push to destination, report status"
//! outside this crate. Starting a run returns an opaque handle; the outcome
//! comes back later as a [`StatusCallback`](super::StatusCallback).

use super::types::{HandoffRequest, LifecycleError};
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Starts orchestrator runs
pub trait Orchestrator: Send + Sync {
    /// Submit a run and return its handle
    fn start_execution(&self, request: &HandoffRequest) -> Result<String>;
}

/// Records handoffs in memory and can simulate an unreachable orchestrator
#[derive(Debug)]
pub struct InMemoryOrchestrator {
    handle_prefix: String,
    available: AtomicBool,
    counter: AtomicU64,
    started: Mutex<Vec<(String, HandoffRequest)>>,
}

impl Default for InMemoryOrchestrator {
    fn default() -> Self {
        Self::new("run-")
    }
}

impl InMemoryOrchestrator {
    pub fn new(handle_prefix: impl Into<String>) -> Self {
        Self {
            handle_prefix: handle_prefix.into(),
            available: AtomicBool::new(true),
            counter: AtomicU64::new(0),
            started: Mutex::new(Vec::new()),
        }
    }

    /// Make subsequent handoffs fail (or succeed again)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Handoffs accepted so far, with their handles
    pub fn started(&self) -> Vec<(String, HandoffRequest)> {
        self.started
            .lock()
            .map(|started| started.clone())
            .unwrap_or_default()
    }
}

impl Orchestrator for InMemoryOrchestrator {
    fn start_execution(&self, request: &HandoffRequest) -> Result<String> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(LifecycleError::HandoffFailed {
                message: "orchestrator unavailable".to_string(),
            }
            .into());
        }

        let sequence = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = format!(
            "{}{}-{}",
            self.handle_prefix, request.migration_id, sequence
        );

        let mut started = self.started.lock().map_err(|_| Error::Internal {
            message: "orchestrator queue lock poisoned".to_string(),
            source: anyhow::anyhow!("a writer panicked while holding the orchestrator queue"),
        })?;
        started.push((handle.clone(), request.clone()));

        debug!(
            migration_id = request.migration_id,
            handle = %handle,
            "Started orchestrator run"
        );
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(migration_id: u64) -> HandoffRequest {
        HandoffRequest {
            dataflow_id: 1,
            migration_id,
            source_data: json!({"id": "p-1"}),
        }
    }

    #[test]
    fn test_handles_are_unique() {
        let orchestrator = InMemoryOrchestrator::new("exec-");
        let first = orchestrator.start_execution(&request(1)).unwrap();
        let second = orchestrator.start_execution(&request(1)).unwrap();
        assert_eq!(first, "exec-1-1");
        assert_eq!(second, "exec-1-2");
        assert_eq!(orchestrator.started().len(), 2);
    }

    #[test]
    fn test_unavailable_orchestrator() {
        let orchestrator = InMemoryOrchestrator::default();
        orchestrator.set_available(false);
        let err = orchestrator.start_execution(&request(3)).unwrap_err();
        assert!(err.to_string().contains("orchestrator unavailable"));
        assert!(orchestrator.started().is_empty());
    }
}
