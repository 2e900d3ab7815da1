//! Flat CSV telemetry store
//!
//! One header row plus one row per record, columns named after the
//! `TelemetryRecord` fields. Replacement writes go to a sibling temp file
//! that is renamed over the target, so readers never see a half-written run.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::persistence::{distinct_houses, select_house, StorageError, TelemetryStore};
use crate::types::TelemetryRecord;

pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every row in file order. A missing file is an empty store.
    fn load(&self) -> Result<Vec<TelemetryRecord>, StorageError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "CSV store not present yet");
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize::<TelemetryRecord>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "telemetry.csv".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl TelemetryStore for CsvStore {
    fn read_all(&self, house_id: &str) -> Result<Vec<TelemetryRecord>, StorageError> {
        Ok(select_house(self.load()?, house_id))
    }

    fn replace_all(&self, records: &[TelemetryRecord]) -> Result<usize, StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;

        info!(path = %self.path.display(), rows = records.len(), "Telemetry store replaced");
        Ok(records.len())
    }

    fn house_ids(&self) -> Result<Vec<String>, StorageError> {
        Ok(distinct_houses(self.load()?.iter()))
    }

    fn backend_name(&self) -> &'static str {
        "Csv"
    }
}
