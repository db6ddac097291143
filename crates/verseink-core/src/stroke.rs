//! Stroke data model: sampled points, tools and colors.

use serde::{Deserialize, Serialize};

/// Pressure substituted when the hardware reports none.
pub const DEFAULT_PRESSURE: f32 = 0.5;

/// One sampled input point in surface-local logical coordinates.
///
/// `pressure` is in `[0, 1]`; a non-positive value means the device did not
/// report pressure and the renderer falls back to [`DEFAULT_PRESSURE`].
/// Tilt angles are in degrees, `[-90, 90]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InkPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub pressure: f32,
    #[serde(default)]
    pub tilt_x: f32,
    #[serde(default)]
    pub tilt_y: f32,
}

impl InkPoint {
    /// Create a point with the given pressure and no tilt.
    pub fn new(x: f32, y: f32, pressure: f32) -> Self {
        Self {
            x,
            y,
            pressure,
            tilt_x: 0.0,
            tilt_y: 0.0,
        }
    }

    /// Set the tilt angles (builder style).
    pub fn with_tilt(mut self, tilt_x: f32, tilt_y: f32) -> Self {
        self.tilt_x = tilt_x;
        self.tilt_y = tilt_y;
        self
    }

    /// Reported pressure, or [`DEFAULT_PRESSURE`] when the device gave none.
    pub fn effective_pressure(&self) -> f32 {
        if self.pressure > 0.0 {
            self.pressure
        } else {
            DEFAULT_PRESSURE
        }
    }
}

/// Available drawing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pen,
    Marker,
    Highlighter,
    Eraser,
}

impl Tool {
    /// Whether this tool removes pixels instead of painting them.
    pub fn is_eraser(&self) -> bool {
        matches!(self, Tool::Eraser)
    }
}

/// Serializable stroke color (RGB).
///
/// The color field is irrelevant to erase semantics; only `tool` decides
/// whether a stroke paints or clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InkColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl InkColor {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }
}

impl Default for InkColor {
    fn default() -> Self {
        Self::black()
    }
}

/// One committed, capture-time-ordered sequence of sampled points plus
/// tool/color/size metadata.
///
/// Invariant: a stroke is only materialized once it has at least two points;
/// single-point taps are discarded before construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub tool: Tool,
    pub color: InkColor,
    pub base_size: f32,
    pub points: Vec<InkPoint>,
}

impl Stroke {
    /// Create a stroke from already-captured points.
    pub fn new(tool: Tool, color: InkColor, base_size: f32, points: Vec<InkPoint>) -> Self {
        Self {
            tool,
            color,
            base_size,
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
