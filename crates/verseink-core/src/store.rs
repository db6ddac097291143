//! Ordered stroke history and the tagged persistence payload.

use crate::stroke::Stroke;

/// Append-mostly list of committed strokes for one document.
///
/// Order equals creation order; strokes are never reordered or merged. The
/// only mutations are append, pop-last (undo) and clear-all.
#[derive(Debug, Clone, Default)]
pub struct StrokeStore {
    strokes: Vec<Stroke>,
}

impl StrokeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a committed stroke.
    pub fn append(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    /// Remove the most recent stroke.
    ///
    /// A no-op returning false on an empty history; the caller triggers a
    /// full redraw when true is returned.
    pub fn undo(&mut self) -> bool {
        self.strokes.pop().is_some()
    }

    /// Empty the history.
    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    /// Replace the whole history, e.g. on document load.
    pub fn replace(&mut self, strokes: Vec<Stroke>) {
        self.strokes = strokes;
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Canonical wire form: a JSON array of stroke records.
    pub fn serialize(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.strokes)
    }
}

/// Decoded persistence payload, discriminated at the boundary.
///
/// Decoding attempts the canonical stroke list first; a recognizable
/// embedded-image payload becomes a one-shot raster blit, and anything else
/// degrades to an empty surface rather than an error to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum StrokePayload {
    /// Canonical JSON stroke list.
    Strokes(Vec<Stroke>),
    /// Legacy embedded raster image (a data URL), blitted once on load.
    Raster(String),
    /// Empty or unrecognized data; renders as an empty surface.
    Empty,
}

impl StrokePayload {
    /// Classify persisted stroke data.
    pub fn decode(data: &str) -> Self {
        let trimmed = data.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str::<Vec<Stroke>>(trimmed) {
            Ok(strokes) => Self::Strokes(strokes),
            Err(err) => {
                if trimmed.starts_with("data:image/") {
                    log::debug!("stroke data is a legacy raster payload");
                    Self::Raster(trimmed.to_string())
                } else {
                    log::warn!("unrecognized stroke data, starting empty: {err}");
                    Self::Empty
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{InkColor, InkPoint, Tool};

    fn stroke(tool: Tool, y: f32) -> Stroke {
        Stroke::new(
            tool,
            InkColor::black(),
            2.0,
            vec![
                InkPoint::new(0.0, y, 0.5).with_tilt(5.0, -3.0),
                InkPoint::new(10.0, y, 0.6),
                InkPoint::new(20.0, y, 0.7),
            ],
        )
    }

    #[test]
    fn test_round_trip_law() {
        let mut store = StrokeStore::new();
        store.append(stroke(Tool::Pen, 0.0));
        store.append(stroke(Tool::Highlighter, 10.0));

        let data = store.serialize().unwrap();
        let StrokePayload::Strokes(back) = StrokePayload::decode(&data) else {
            panic!("expected a stroke list");
        };

        assert_eq!(back, store.strokes());
    }

    #[test]
    fn test_undo_removes_last() {
        let mut store = StrokeStore::new();
        store.append(stroke(Tool::Pen, 0.0));
        store.append(stroke(Tool::Marker, 10.0));

        assert!(store.undo());
        assert_eq!(store.len(), 1);
        assert_eq!(store.strokes()[0].tool, Tool::Pen);
    }

    #[test]
    fn test_undo_empty_is_noop() {
        let mut store = StrokeStore::new();
        assert!(!store.undo());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut store = StrokeStore::new();
        store.append(stroke(Tool::Pen, 0.0));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_decode_garbage_is_empty() {
        let _ = env_logger::builder().is_test(true).try_init();
        assert_eq!(StrokePayload::decode("not json"), StrokePayload::Empty);
        assert_eq!(StrokePayload::decode(""), StrokePayload::Empty);
        assert_eq!(StrokePayload::decode("{\"weird\":1}"), StrokePayload::Empty);
    }

    #[test]
    fn test_decode_empty_list() {
        assert_eq!(StrokePayload::decode("[]"), StrokePayload::Strokes(Vec::new()));
    }

    #[test]
    fn test_decode_legacy_raster() {
        let data = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(
            StrokePayload::decode(data),
            StrokePayload::Raster(data.to_string())
        );
    }
}
