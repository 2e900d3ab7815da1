//! Telemetry Storage
//!
//! A single logical store of `TelemetryRecord`s queried by house id. Each
//! simulation run replaces the whole store.

mod csv_store;
pub mod persistence;

pub use csv_store::CsvStore;
pub use persistence::{InMemoryStore, StorageError, TelemetryStore};
