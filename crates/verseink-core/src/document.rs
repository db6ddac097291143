//! Per-location annotation documents and the margin extension.

use crate::storage::{AnnotationRecord, unix_millis};
use crate::store::{StrokePayload, StrokeStore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hard cap on extra writing space below the content, logical pixels.
pub const MAX_MARGIN_EXTENSION: f32 = 2000.0;

/// Identifies one annotation document: a (book, chapter)-equivalent location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    pub location: String,
    pub section: u32,
}

impl DocumentKey {
    pub fn new(location: impl Into<String>, section: u32) -> Self {
        Self {
            location: location.into(),
            section,
        }
    }

    /// Stable key string for the external key-value store.
    pub fn storage_key(&self) -> String {
        format!("{}:{}", self.location, self.section)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.location, self.section)
    }
}

/// In-memory aggregate for one document: stroke history plus margin state.
///
/// Created lazily on first stroke or first margin drag; persisted as a whole
/// on every mutation; deleted only by an explicit clear-all.
#[derive(Debug, Clone)]
pub struct AnnotationDocument {
    pub key: DocumentKey,
    pub store: StrokeStore,
    margin_extension: f32,
    last_modified: u64,
}

impl AnnotationDocument {
    pub fn new(key: DocumentKey) -> Self {
        Self {
            key,
            store: StrokeStore::new(),
            margin_extension: 0.0,
            last_modified: 0,
        }
    }

    pub fn margin_extension(&self) -> f32 {
        self.margin_extension
    }

    pub fn last_modified(&self) -> u64 {
        self.last_modified
    }

    /// Set the margin extension, clamped to `[0, MAX_MARGIN_EXTENSION]`.
    /// Returns the applied value.
    pub fn set_margin_extension(&mut self, value: f32) -> f32 {
        self.margin_extension = value.clamp(0.0, MAX_MARGIN_EXTENSION);
        self.touch();
        self.margin_extension
    }

    /// No stroke data and zero margin extension.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty() && self.margin_extension == 0.0
    }

    /// Stamp the document as modified now.
    pub fn touch(&mut self) {
        self.last_modified = unix_millis();
    }

    /// Snapshot the document as a persistence record.
    pub fn to_record(&self) -> serde_json::Result<AnnotationRecord> {
        Ok(AnnotationRecord {
            stroke_data: self.store.serialize()?,
            margin_height: self.margin_extension,
            last_modified: self.last_modified,
        })
    }

    /// Restore state from a loaded record.
    ///
    /// Malformed stroke data degrades to an empty history; the decoded
    /// payload is returned so the caller can perform a legacy raster blit.
    pub fn apply_record(&mut self, record: &AnnotationRecord) -> StrokePayload {
        let payload = StrokePayload::decode(&record.stroke_data);
        match &payload {
            StrokePayload::Strokes(strokes) => self.store.replace(strokes.clone()),
            _ => self.store.replace(Vec::new()),
        }
        self.margin_extension = record.margin_height.clamp(0.0, MAX_MARGIN_EXTENSION);
        self.last_modified = record.last_modified;
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{InkColor, InkPoint, Stroke, Tool};

    #[test]
    fn test_storage_key() {
        let key = DocumentKey::new("john", 3);
        assert_eq!(key.storage_key(), "john:3");
    }

    #[test]
    fn test_margin_clamped() {
        let mut doc = AnnotationDocument::new(DocumentKey::new("psalms", 23));
        assert_eq!(doc.set_margin_extension(-10.0), 0.0);
        assert_eq!(doc.set_margin_extension(500.0), 500.0);
        assert_eq!(
            doc.set_margin_extension(MAX_MARGIN_EXTENSION + 1.0),
            MAX_MARGIN_EXTENSION
        );
    }

    #[test]
    fn test_empty_tracks_strokes_and_margin() {
        let mut doc = AnnotationDocument::new(DocumentKey::new("mark", 1));
        assert!(doc.is_empty());

        doc.set_margin_extension(100.0);
        assert!(!doc.is_empty());

        doc.set_margin_extension(0.0);
        doc.store.append(Stroke::new(
            Tool::Pen,
            InkColor::black(),
            2.0,
            vec![InkPoint::new(0.0, 0.0, 0.5), InkPoint::new(1.0, 1.0, 0.5)],
        ));
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_record_round_trip() {
        let mut doc = AnnotationDocument::new(DocumentKey::new("luke", 15));
        doc.store.append(Stroke::new(
            Tool::Marker,
            InkColor::new(30, 60, 90),
            3.0,
            vec![InkPoint::new(0.0, 0.0, 0.4), InkPoint::new(8.0, 4.0, 0.9)],
        ));
        doc.set_margin_extension(500.0);

        let record = doc.to_record().unwrap();
        let mut restored = AnnotationDocument::new(doc.key.clone());
        let payload = restored.apply_record(&record);

        assert!(matches!(payload, StrokePayload::Strokes(_)));
        assert_eq!(restored.store.strokes(), doc.store.strokes());
        assert_eq!(restored.margin_extension(), 500.0);
    }

    #[test]
    fn test_malformed_record_degrades_to_empty() {
        let record = AnnotationRecord {
            stroke_data: "not json".to_string(),
            margin_height: 40.0,
            last_modified: 7,
        };

        let mut doc = AnnotationDocument::new(DocumentKey::new("acts", 2));
        let payload = doc.apply_record(&record);

        assert_eq!(payload, StrokePayload::Empty);
        assert!(doc.store.is_empty());
        assert_eq!(doc.margin_extension(), 40.0);
    }
}
