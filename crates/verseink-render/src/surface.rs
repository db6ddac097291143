//! Backing-surface ownership: DPR-aware sizing and full-history replay.

use crate::brush::segment_style;
use crate::raster::{CodecError, CoverageMask, RasterSurface};
use kurbo::{ParamCurve, ParamCurveArclen, Point, QuadBez};
use verseink_core::stroke::{InkColor, InkPoint, Stroke, Tool};

/// Spacing between stamped dabs as a fraction of the segment radius.
const DAB_SPACING_FACTOR: f64 = 0.4;

/// Owns the backing raster surface.
///
/// Tracks device pixel ratio and observed logical size; any size change
/// reallocates the backing store at the new physical resolution and replays
/// the full stroke history. That replay is the only path that rebuilds
/// content from scratch, and is also used after undo, clear and initial load.
#[derive(Debug)]
pub struct SurfaceManager {
    surface: RasterSurface,
    logical_width: f32,
    logical_height: f32,
    scale_factor: f32,
}

impl Default for SurfaceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceManager {
    /// Create an unmounted manager; nothing renders until the first resize.
    pub fn new() -> Self {
        Self {
            surface: RasterSurface::new(0, 0),
            logical_width: 0.0,
            logical_height: 0.0,
            scale_factor: 1.0,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.width() > 0 && self.surface.height() > 0
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    /// Observed logical size, `(width, height)`.
    pub fn logical_size(&self) -> (f32, f32) {
        (self.logical_width, self.logical_height)
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    /// Apply an observed size change.
    ///
    /// Reallocates the backing store at the new physical resolution and
    /// replays `history`. Returns true when a reallocation happened; a
    /// zero-sized (unmounted) observation is a no-op.
    pub fn resize(
        &mut self,
        logical_width: f32,
        logical_height: f32,
        scale_factor: f32,
        history: &[Stroke],
    ) -> bool {
        if logical_width <= 0.0 || logical_height <= 0.0 || scale_factor <= 0.0 {
            return false;
        }
        let physical_w = (logical_width * scale_factor).round().max(1.0) as u32;
        let physical_h = (logical_height * scale_factor).round().max(1.0) as u32;
        if physical_w == self.surface.width()
            && physical_h == self.surface.height()
            && (scale_factor - self.scale_factor).abs() < f32::EPSILON
        {
            return false;
        }

        self.logical_width = logical_width;
        self.logical_height = logical_height;
        self.scale_factor = scale_factor;
        self.surface = RasterSurface::new(physical_w, physical_h);
        self.redraw(history);
        true
    }

    /// Full redraw: clear, then re-draw every segment of every stroke.
    pub fn redraw(&mut self, history: &[Stroke]) {
        self.surface.clear();
        for stroke in history {
            self.draw_stroke(stroke);
        }
    }

    /// Clear the surface without touching size or history.
    pub fn clear(&mut self) {
        self.surface.clear();
    }

    /// Draw one committed stroke, segment by segment.
    pub fn draw_stroke(&mut self, stroke: &Stroke) {
        for i in 1..stroke.points.len() {
            let prev = (i >= 2).then(|| stroke.points[i - 2]);
            self.draw_segment(
                prev,
                stroke.points[i - 1],
                stroke.points[i],
                stroke.tool,
                stroke.color,
                stroke.base_size,
            );
        }
    }

    /// Draw one segment with the tool's width/opacity/compositing rules.
    ///
    /// The segment is a quadratic through the midpoints of adjacent points
    /// with the shared point as control, which hides faceting that straight
    /// chords would show at speed. Without a preceding point it degenerates
    /// to a straight segment.
    pub fn draw_segment(
        &mut self,
        prev: Option<InkPoint>,
        from: InkPoint,
        to: InkPoint,
        tool: Tool,
        color: InkColor,
        base_size: f32,
    ) {
        if !self.is_mounted() {
            return;
        }
        let style = segment_style(tool, color, base_size, &to);
        let s = self.scale_factor as f64;
        let radius = (style.width as f64 * s / 2.0).max(0.5);
        let phys = |p: &InkPoint| Point::new(p.x as f64 * s, p.y as f64 * s);

        let (a, ctrl, b) = match prev {
            Some(prev) => (
                midpoint(phys(&prev), phys(&from)),
                phys(&from),
                midpoint(phys(&from), phys(&to)),
            ),
            None => (phys(&from), midpoint(phys(&from), phys(&to)), phys(&to)),
        };
        let quad = QuadBez::new(a, ctrl, b);
        let length = quad.arclen(0.25);
        let spacing = (radius * DAB_SPACING_FACTOR).max(0.75);
        let steps = (length / spacing).ceil().max(1.0) as usize;

        // The curve stays inside the hull of its control points.
        let pad = radius + 1.0;
        let mut mask = CoverageMask::from_bounds(
            a.x.min(ctrl.x).min(b.x) - pad,
            a.y.min(ctrl.y).min(b.y) - pad,
            a.x.max(ctrl.x).max(b.x) + pad,
            a.y.max(ctrl.y).max(b.y) + pad,
        );
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let center = quad.eval(t);
            mask.stamp_dab(center.x, center.y, radius);
        }
        self.surface
            .composite_mask(&mask, style.color, style.opacity, style.blend);
    }

    /// One-shot blit of a legacy embedded raster payload.
    pub fn blit_data_url(&mut self, data: &str) -> Result<(), CodecError> {
        self.surface.blit_data_url(data)
    }

    /// Copy of the surface pixels.
    pub fn snapshot(&self) -> image::RgbaImage {
        self.surface.pixels().clone()
    }

    /// Copy of the surface with alpha scaled, for the read-only replay mode.
    pub fn faded_snapshot(&self, opacity: f32) -> image::RgbaImage {
        self.surface.faded(opacity)
    }

    /// Encode the current surface as a PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, CodecError> {
        self.surface.encode_png()
    }
}

fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_stroke(tool: Tool, y: f32) -> Stroke {
        Stroke::new(
            tool,
            InkColor::black(),
            2.0,
            vec![
                InkPoint::new(10.0, y, 0.8),
                InkPoint::new(30.0, y, 0.8),
                InkPoint::new(50.0, y, 0.8),
            ],
        )
    }

    fn inked(surface: &SurfaceManager, x: u32, y: u32) -> bool {
        surface.surface().alpha_at(x, y) > 0
    }

    #[test]
    fn test_unmounted_resize_is_noop() {
        let mut mgr = SurfaceManager::new();
        assert!(!mgr.resize(0.0, 100.0, 1.0, &[]));
        assert!(!mgr.resize(100.0, -5.0, 1.0, &[]));
        assert!(!mgr.is_mounted());

        // Drawing on an unmounted surface must not panic.
        mgr.draw_stroke(&line_stroke(Tool::Pen, 10.0));
    }

    #[test]
    fn test_resize_replays_all_strokes() {
        let history = vec![
            line_stroke(Tool::Pen, 10.0),
            line_stroke(Tool::Pen, 30.0),
            line_stroke(Tool::Pen, 50.0),
        ];

        let mut mgr = SurfaceManager::new();
        assert!(mgr.resize(100.0, 100.0, 1.0, &history));

        // All N strokes reconstructed, none lost.
        let bands = [10u32, 30, 50];
        for &y in &bands {
            assert!(inked(&mgr, 30, y), "stroke band at y={y} missing");
        }
        // Nothing drawn between the bands.
        assert!(!inked(&mgr, 30, 20));
        assert!(!inked(&mgr, 30, 40));
    }

    #[test]
    fn test_resize_scales_with_device_pixel_ratio() {
        let history = vec![line_stroke(Tool::Pen, 20.0)];
        let mut mgr = SurfaceManager::new();
        mgr.resize(100.0, 100.0, 2.0, &history);

        assert_eq!(mgr.surface().width(), 200);
        assert_eq!(mgr.surface().height(), 200);
        // Logical (30, 20) lands at physical (60, 40).
        assert!(inked(&mgr, 60, 40));
    }

    #[test]
    fn test_same_size_resize_is_noop() {
        let mut mgr = SurfaceManager::new();
        assert!(mgr.resize(100.0, 100.0, 1.0, &[]));
        assert!(!mgr.resize(100.0, 100.0, 1.0, &[]));
    }

    #[test]
    fn test_eraser_clears_pen_ink() {
        let mut mgr = SurfaceManager::new();
        mgr.resize(100.0, 100.0, 1.0, &[]);

        mgr.draw_stroke(&line_stroke(Tool::Pen, 25.0));
        assert!(inked(&mgr, 30, 25));

        // Eraser color is irrelevant; coverage alone clears.
        let mut eraser = line_stroke(Tool::Eraser, 25.0);
        eraser.color = InkColor::new(200, 10, 10);
        mgr.draw_stroke(&eraser);
        assert!(!inked(&mgr, 30, 25));
    }

    #[test]
    fn test_undo_style_redraw_drops_last_stroke() {
        let mut history = vec![line_stroke(Tool::Pen, 10.0), line_stroke(Tool::Pen, 40.0)];
        let mut mgr = SurfaceManager::new();
        mgr.resize(100.0, 100.0, 1.0, &history);
        assert!(inked(&mgr, 30, 40));

        history.pop();
        mgr.redraw(&history);
        assert!(inked(&mgr, 30, 10));
        assert!(!inked(&mgr, 30, 40));
    }
}
