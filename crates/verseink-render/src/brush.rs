//! Per-tool width, opacity and blend rules.

use peniko::{BlendMode, Compose, Mix};
use verseink_core::stroke::{InkColor, InkPoint, Tool};

/// Tilt angle beyond which the pen widens calligraphically, degrees.
const TILT_THRESHOLD_DEG: f32 = 15.0;

/// Resolved rendering parameters for one stroke segment.
#[derive(Debug, Clone, Copy)]
pub struct SegmentStyle {
    /// Stroke width in logical pixels.
    pub width: f32,
    pub color: InkColor,
    /// Paint opacity in `[0, 1]`.
    pub opacity: f32,
    pub blend: BlendMode,
}

/// Pressure- and tilt-sensitive width for a segment ending at `to`.
///
/// Width = `base_size × (0.15 + pressure × 1.7)`, with the pen widening by
/// `1 + (|tilt_x| + |tilt_y|)/180` past the tilt threshold.
pub fn effective_width(tool: Tool, base_size: f32, to: &InkPoint) -> f32 {
    let mut width = base_size * (0.15 + to.effective_pressure() * 1.7);
    if tool == Tool::Pen
        && (to.tilt_x.abs() > TILT_THRESHOLD_DEG || to.tilt_y.abs() > TILT_THRESHOLD_DEG)
    {
        width *= 1.0 + (to.tilt_x.abs() + to.tilt_y.abs()) / 180.0;
    }
    width
}

/// Resolve the rendering parameters for one segment of a stroke.
pub fn segment_style(tool: Tool, color: InkColor, base_size: f32, to: &InkPoint) -> SegmentStyle {
    match tool {
        Tool::Pen => SegmentStyle {
            width: effective_width(tool, base_size, to),
            color,
            opacity: 1.0,
            blend: BlendMode::new(Mix::Normal, Compose::SrcOver),
        },
        Tool::Marker => SegmentStyle {
            width: 2.5 * effective_width(tool, base_size, to),
            color,
            opacity: 0.7,
            blend: BlendMode::new(Mix::Normal, Compose::SrcOver),
        },
        Tool::Highlighter => SegmentStyle {
            width: 5.0 * base_size,
            color,
            opacity: 0.25,
            blend: BlendMode::new(Mix::Multiply, Compose::SrcOver),
        },
        // Color is irrelevant to erasing; only coverage matters.
        Tool::Eraser => SegmentStyle {
            width: 4.0 * base_size,
            color,
            opacity: 1.0,
            blend: BlendMode::new(Mix::Normal, Compose::DestOut),
        },
    }
}
