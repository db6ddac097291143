//! VerseInk Core Library
//!
//! Platform-agnostic stroke capture, history and persistence for the VerseInk
//! handwriting/annotation engine.

pub mod document;
pub mod sampler;
pub mod storage;
pub mod store;
pub mod stroke;

pub use document::{AnnotationDocument, DocumentKey, MAX_MARGIN_EXTENSION};
pub use sampler::{DownOutcome, InputSampler, PendingSegment, PointerDown, PointerKind};
pub use storage::{
    AnnotationRecord, KeyValueStore, MemoryStore, PersistError, PersistResult, PersistenceBridge,
};
pub use store::{StrokePayload, StrokeStore};
pub use stroke::{InkColor, InkPoint, Stroke, Tool};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;
