//! Storage abstraction for the external key-value collaborator.

mod bridge;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use bridge::{DEFAULT_MARGIN_SETTLE_MS, PersistenceBridge};
pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

/// Persistence errors.
///
/// Reported to the caller but never allowed to block interactive drawing;
/// the in-memory stroke store stays authoritative regardless of outcome.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// One persisted annotation document, keyed externally by its document key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    /// Serialized stroke list (canonical) or a legacy raster data URL.
    pub stroke_data: String,
    /// Margin extension in logical pixels.
    pub margin_height: f32,
    /// Wall-clock modification time, milliseconds since the Unix epoch.
    pub last_modified: u64,
}

/// Contract of the external key-value store: get/put/delete.
///
/// Note: on native platforms implementations must be Send + Sync.
/// On WASM these bounds are relaxed since it is single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the record for a key.
    fn get(&self, key: &str) -> BoxFuture<'_, PersistResult<AnnotationRecord>>;

    /// Write the record for a key, replacing any previous value.
    fn put(&self, key: &str, record: &AnnotationRecord) -> BoxFuture<'_, PersistResult<()>>;

    /// Remove the record for a key. Absent keys are not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, PersistResult<()>>;
}

/// Contract of the external key-value store (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait KeyValueStore {
    /// Fetch the record for a key.
    fn get(&self, key: &str) -> BoxFuture<'_, PersistResult<AnnotationRecord>>;

    /// Write the record for a key, replacing any previous value.
    fn put(&self, key: &str, record: &AnnotationRecord) -> BoxFuture<'_, PersistResult<()>>;

    /// Remove the record for a key. Absent keys are not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, PersistResult<()>>;
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
