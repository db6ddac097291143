//! VerseInk Render Library
//!
//! Raster surface ownership, per-tool compositing and overlay composition for
//! the VerseInk handwriting/annotation engine.

pub mod brush;
pub mod overlay;
pub mod raster;
pub mod scheduler;
pub mod surface;

pub use brush::{SegmentStyle, effective_width, segment_style};
pub use overlay::{AnnotationOverlay, OverlayMode, READONLY_OPACITY};
pub use raster::{CodecError, CoverageMask, RasterSurface};
pub use scheduler::{RenderScheduler, SchedulerState};
pub use surface::SurfaceManager;
