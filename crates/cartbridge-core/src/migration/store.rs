//! Migration log persistence
//!
//! Status transitions are read-modify-write on a single row. Stores must run
//! [`MigrationLogStore::update`] under a per-row exclusive lock so a local
//! failure and an orchestrator callback can never lose each other's write.

use super::types::{LifecycleError, MigrationLog, MigrationStatus};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Row-level access to migration logs
pub trait MigrationLogStore: Send + Sync {
    /// Insert a new log, assigning its id
    fn insert(&self, log: MigrationLog) -> Result<MigrationLog>;

    fn get(&self, migration_id: u64) -> Result<MigrationLog>;

    /// Atomically apply `change` to one row
    ///
    /// The row is left untouched when `change` returns an error.
    fn update(
        &self,
        migration_id: u64,
        change: &mut dyn FnMut(&mut MigrationLog) -> Result<()>,
    ) -> Result<MigrationLog>;

    /// Logs of one dataflow in insertion order, optionally filtered by status
    fn list_for_dataflow(
        &self,
        dataflow_id: u64,
        status: Option<MigrationStatus>,
    ) -> Result<Vec<MigrationLog>>;

    fn count_for_dataflow(&self, dataflow_id: u64) -> Result<usize>;
}

/// In-memory store with one mutex per row
#[derive(Debug, Default)]
pub struct InMemoryMigrationLogStore {
    rows: RwLock<BTreeMap<u64, Arc<Mutex<MigrationLog>>>>,
    next_id: AtomicU64,
}

impl InMemoryMigrationLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn row(&self, migration_id: u64) -> Result<Arc<Mutex<MigrationLog>>> {
        let rows = self.rows.read().map_err(|_| poisoned("migration log table"))?;
        rows.get(&migration_id)
            .cloned()
            .ok_or_else(|| LifecycleError::MigrationNotFound { migration_id }.into())
    }

    fn snapshot(&self) -> Result<Vec<MigrationLog>> {
        let rows: Vec<Arc<Mutex<MigrationLog>>> = {
            let rows = self.rows.read().map_err(|_| poisoned("migration log table"))?;
            rows.values().cloned().collect()
        };

        rows.iter()
            .map(|row| {
                row.lock()
                    .map(|log| log.clone())
                    .map_err(|_| poisoned("migration log row"))
            })
            .collect()
    }
}

fn poisoned(what: &str) -> Error {
    Error::Internal {
        message: format!("{} lock poisoned", what),
        source: anyhow::anyhow!("a writer panicked while holding the {} lock", what),
    }
}

impl MigrationLogStore for InMemoryMigrationLogStore {
    fn insert(&self, mut log: MigrationLog) -> Result<MigrationLog> {
        log.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = log.clone();
        let mut rows = self.rows.write().map_err(|_| poisoned("migration log table"))?;
        rows.insert(log.id, Arc::new(Mutex::new(log)));
        Ok(stored)
    }

    fn get(&self, migration_id: u64) -> Result<MigrationLog> {
        let row = self.row(migration_id)?;
        let log = row.lock().map_err(|_| poisoned("migration log row"))?;
        Ok(log.clone())
    }

    fn update(
        &self,
        migration_id: u64,
        change: &mut dyn FnMut(&mut MigrationLog) -> Result<()>,
    ) -> Result<MigrationLog> {
        let row = self.row(migration_id)?;
        let mut log = row.lock().map_err(|_| poisoned("migration log row"))?;

        let mut draft = log.clone();
        change(&mut draft)?;
        *log = draft;
        Ok(log.clone())
    }

    fn list_for_dataflow(
        &self,
        dataflow_id: u64,
        status: Option<MigrationStatus>,
    ) -> Result<Vec<MigrationLog>> {
        Ok(self
            .snapshot()?
            .into_iter()
            .filter(|log| log.dataflow_id == dataflow_id)
            .filter(|log| status.map_or(true, |status| log.status == status))
            .collect())
    }

    fn count_for_dataflow(&self, dataflow_id: u64) -> Result<usize> {
        Ok(self.list_for_dataflow(dataflow_id, None)?.len())
    }
}
