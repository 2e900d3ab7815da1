//! TelemetryStore trait - pluggable storage backend
//!
//! Abstracts telemetry persistence so the service never touches files
//! directly:
//! - `InMemoryStore`: for tests and ephemeral deployments
//! - `CsvStore`: flat tabular file addressed by path

use std::sync::{Arc, RwLock};

use crate::types::TelemetryRecord;

/// Trait for pluggable telemetry backends.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks. Writes are full replacements; callers serialize
/// them against reads.
pub trait TelemetryStore: Send + Sync {
    /// All records of one house, timestamp ascending. Unknown house → empty.
    fn read_all(&self, house_id: &str) -> Result<Vec<TelemetryRecord>, StorageError>;

    /// Replace the entire store contents. Returns the number of rows written.
    fn replace_all(&self, records: &[TelemetryRecord]) -> Result<usize, StorageError>;

    /// The most recent `limit` records of one house, timestamp ascending.
    fn read_recent(&self, house_id: &str, limit: usize) -> Result<Vec<TelemetryRecord>, StorageError> {
        let mut records = self.read_all(house_id)?;
        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
        Ok(records)
    }

    /// Distinct house ids in first-seen order.
    fn house_ids(&self) -> Result<Vec<String>, StorageError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("storage lock poisoned: {0}")]
    Lock(String),
}

impl<T: TelemetryStore + ?Sized> TelemetryStore for Arc<T> {
    fn read_all(&self, house_id: &str) -> Result<Vec<TelemetryRecord>, StorageError> {
        (**self).read_all(house_id)
    }

    fn replace_all(&self, records: &[TelemetryRecord]) -> Result<usize, StorageError> {
        (**self).replace_all(records)
    }

    fn read_recent(&self, house_id: &str, limit: usize) -> Result<Vec<TelemetryRecord>, StorageError> {
        (**self).read_recent(house_id, limit)
    }

    fn house_ids(&self) -> Result<Vec<String>, StorageError> {
        (**self).house_ids()
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

/// Stable filter + sort shared by the backends.
pub(crate) fn select_house(records: impl IntoIterator<Item = TelemetryRecord>, house_id: &str) -> Vec<TelemetryRecord> {
    let mut selected: Vec<_> = records.into_iter().filter(|r| r.house_id == house_id).collect();
    selected.sort_by_key(|r| r.timestamp);
    selected
}

pub(crate) fn distinct_houses<'a>(records: impl IntoIterator<Item = &'a TelemetryRecord>) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for r in records {
        if !ids.contains(&r.house_id) {
            ids.push(r.house_id.clone());
        }
    }
    ids
}

/// In-memory telemetry store.
///
/// Thread-safe via `RwLock`. Not durable, data is lost on restart.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<TelemetryRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TelemetryStore for InMemoryStore {
    fn read_all(&self, house_id: &str) -> Result<Vec<TelemetryRecord>, StorageError> {
        let store = self
            .records
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(select_house(store.iter().cloned(), house_id))
    }

    fn replace_all(&self, records: &[TelemetryRecord]) -> Result<usize, StorageError> {
        let mut store = self
            .records
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        *store = records.to_vec();
        Ok(store.len())
    }

    fn house_ids(&self) -> Result<Vec<String>, StorageError> {
        let store = self
            .records
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(distinct_houses(store.iter()))
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}
