//! Bridge between the in-memory document and the external key-value store.

use super::{AnnotationRecord, KeyValueStore, PersistError, PersistResult};
use crate::document::{AnnotationDocument, DocumentKey};
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};
#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Settle interval before a margin-dirty record is flushed, milliseconds.
pub const DEFAULT_MARGIN_SETTLE_MS: u64 = 500;

/// Owns the persistence side of a document's lifecycle.
///
/// Stroke commits are saved immediately and fire-and-forget; margin drags
/// mark the record dirty and flush after a settle interval so a continuous
/// drag does not produce a write per sample. Failures are reported to the
/// caller but never gate drawing; the in-memory store stays authoritative.
pub struct PersistenceBridge<S: KeyValueStore> {
    storage: Arc<S>,
    settle: Duration,
    last_flush: Option<Instant>,
    dirty: bool,
    current: Option<DocumentKey>,
}

impl<S: KeyValueStore> PersistenceBridge<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            settle: Duration::from_millis(DEFAULT_MARGIN_SETTLE_MS),
            last_flush: None,
            dirty: false,
            current: None,
        }
    }

    /// Set the margin settle interval.
    pub fn set_settle_interval(&mut self, settle: Duration) {
        self.settle = settle;
    }

    /// Key of the document currently bound to this bridge.
    pub fn current_key(&self) -> Option<&DocumentKey> {
        self.current.as_ref()
    }

    /// Mark the bound record as having unsaved changes (e.g. a margin drag).
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether a dirty record has settled long enough to flush.
    pub fn should_flush(&self) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_flush {
            Some(last) => last.elapsed() >= self.settle,
            None => true,
        }
    }

    /// Save the document immediately (stroke-commit path).
    pub async fn save(&mut self, document: &AnnotationDocument) -> PersistResult<()> {
        let record = document
            .to_record()
            .map_err(|e| PersistError::Serialization(e.to_string()))?;

        self.storage.put(&document.key.storage_key(), &record).await?;

        self.current = Some(document.key.clone());
        self.last_flush = Some(Instant::now());
        self.dirty = false;
        Ok(())
    }

    /// Flush the document if dirty and settled. Returns true when a write
    /// was performed.
    pub async fn maybe_flush(&mut self, document: &AnnotationDocument) -> PersistResult<bool> {
        if !self.should_flush() {
            return Ok(false);
        }
        self.save(document).await?;
        Ok(true)
    }

    /// Switch to another document.
    ///
    /// Any pending unsaved state of the outgoing document is flushed before
    /// the incoming record loads. Returns the stored record for the new key,
    /// or None when the document has never been saved.
    pub async fn switch(
        &mut self,
        outgoing: Option<&AnnotationDocument>,
        key: &DocumentKey,
    ) -> PersistResult<Option<AnnotationRecord>> {
        if self.dirty {
            if let Some(doc) = outgoing {
                self.save(doc).await?;
            }
        }

        self.current = Some(key.clone());
        self.dirty = false;
        match self.storage.get(&key.storage_key()).await {
            Ok(record) => Ok(Some(record)),
            Err(PersistError::NotFound(_)) => Ok(None),
            Err(err) => {
                log::warn!("loading annotations for {key} failed: {err}");
                Err(err)
            }
        }
    }

    /// Remove the stored record for a document (explicit clear-all).
    pub async fn delete(&mut self, key: &DocumentKey) -> PersistResult<()> {
        self.dirty = false;
        self.storage.delete(&key.storage_key()).await
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}
