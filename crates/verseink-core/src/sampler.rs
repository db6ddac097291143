//! Pointer/stylus capture: coalesced sampling, tool toggling, commit rules.

use crate::stroke::{InkColor, InkPoint, Stroke, Tool};

/// Shortest gap between two pen downs that still counts as a double tap, ms.
const DOUBLE_TAP_MIN_MS: f64 = 50.0;
/// Longest gap between two pen downs that still counts as a double tap, ms.
const DOUBLE_TAP_MAX_MS: f64 = 300.0;

/// Default stroke width before pressure scaling, logical pixels.
const DEFAULT_BASE_SIZE: f32 = 2.0;

/// Pointer device class, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

/// A pointer-down event.
///
/// `time_ms` is the platform event timestamp; capture logic never reads a
/// clock of its own, so tap detection stays deterministic.
#[derive(Debug, Clone, Copy)]
pub struct PointerDown {
    pub pointer_id: u32,
    pub kind: PointerKind,
    /// Whether the platform flags this as the primary pointer.
    pub primary: bool,
    pub time_ms: f64,
    pub sample: InkPoint,
}

/// What a pointer-down resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownOutcome {
    /// A new point buffer began; the scheduler should start ticking.
    CaptureStarted,
    /// A stylus double tap consumed the event and toggled the tool.
    ToolToggled(Tool),
    /// Secondary pointer, or a capture is already in progress.
    Rejected,
}

/// A buffered segment not yet handed to the renderer.
///
/// `prev` is the point before `from`, used for midpoint smoothing.
#[derive(Debug, Clone, Copy)]
pub struct PendingSegment {
    pub prev: Option<InkPoint>,
    pub from: InkPoint,
    pub to: InkPoint,
}

/// Double-tap detector for stylus tool toggling.
///
/// Holds only the previous pen-down timestamp and a fixed window; a detected
/// tap resets the window so a third tap starts over.
#[derive(Debug, Default)]
struct TapToggle {
    last_pen_down_ms: Option<f64>,
}

impl TapToggle {
    /// Feed a pen-down timestamp; true when it completes a double tap.
    fn register(&mut self, time_ms: f64) -> bool {
        let hit = self.last_pen_down_ms.is_some_and(|last| {
            let gap = time_ms - last;
            (DOUBLE_TAP_MIN_MS..=DOUBLE_TAP_MAX_MS).contains(&gap)
        });
        self.last_pen_down_ms = if hit { None } else { Some(time_ms) };
        hit
    }
}

/// Converts raw pointer events into the ordered point buffer of the active
/// stroke.
///
/// At most one capture session exists per sampler; secondary non-stylus
/// pointers are rejected to avoid multi-touch interference. The buffer is
/// independent of the backing surface, so an in-progress stroke survives a
/// concurrent resize.
#[derive(Debug)]
pub struct InputSampler {
    tool: Tool,
    color: InkColor,
    base_size: f32,
    /// Tool restored when the eraser toggle flips back.
    tool_before_eraser: Tool,
    tap_toggle: TapToggle,
    /// Uncommitted points of the active stroke, capture order.
    buffer: Vec<InkPoint>,
    /// Pointer owning the active capture.
    active_pointer: Option<u32>,
    /// Index of the next buffered point that has not been rendered yet.
    drawn: usize,
}

impl Default for InputSampler {
    fn default() -> Self {
        Self {
            tool: Tool::default(),
            color: InkColor::default(),
            base_size: DEFAULT_BASE_SIZE,
            tool_before_eraser: Tool::default(),
            tap_toggle: TapToggle::default(),
            buffer: Vec::new(),
            active_pointer: None,
            drawn: 0,
        }
    }
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> InkColor {
        self.color
    }

    pub fn base_size(&self) -> f32 {
        self.base_size
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if tool != Tool::Eraser {
            self.tool_before_eraser = tool;
        }
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: InkColor) {
        self.color = color;
    }

    pub fn set_base_size(&mut self, size: f32) {
        self.base_size = size;
    }

    pub fn is_capturing(&self) -> bool {
        self.active_pointer.is_some()
    }

    /// Flip between the current tool and the eraser.
    fn toggle_eraser(&mut self) -> Tool {
        if self.tool == Tool::Eraser {
            self.tool = self.tool_before_eraser;
        } else {
            self.tool_before_eraser = self.tool;
            self.tool = Tool::Eraser;
        }
        self.tool
    }

    /// Handle pointer-down.
    ///
    /// A stylus double tap toggles the tool and consumes the event; no stroke
    /// starts. Non-stylus input is accepted only from the primary pointer,
    /// and any down while a capture is in progress is rejected.
    pub fn pointer_down(&mut self, evt: PointerDown) -> DownOutcome {
        if evt.kind == PointerKind::Pen && self.tap_toggle.register(evt.time_ms) {
            return DownOutcome::ToolToggled(self.toggle_eraser());
        }
        if self.active_pointer.is_some() {
            return DownOutcome::Rejected;
        }
        if evt.kind != PointerKind::Pen && !evt.primary {
            return DownOutcome::Rejected;
        }

        self.buffer.clear();
        self.buffer.push(evt.sample);
        self.drawn = 0;
        self.active_pointer = Some(evt.pointer_id);
        DownOutcome::CaptureStarted
    }

    /// Append coalesced sub-frame samples while capturing.
    ///
    /// The caller passes the platform's coalesced list, or the single event
    /// sample when the platform exposes none.
    pub fn pointer_move(&mut self, pointer_id: u32, samples: &[InkPoint]) {
        if self.active_pointer != Some(pointer_id) {
            return;
        }
        self.buffer.extend_from_slice(samples);
    }

    /// Finish the capture. Returns a committed stroke when the buffer holds
    /// at least two points; single-point taps are discarded silently.
    pub fn pointer_up(&mut self, pointer_id: u32) -> Option<Stroke> {
        if self.active_pointer != Some(pointer_id) {
            return None;
        }
        self.active_pointer = None;
        self.drawn = 0;
        let points = std::mem::take(&mut self.buffer);
        if points.len() < 2 {
            return None;
        }
        Some(Stroke::new(self.tool, self.color, self.base_size, points))
    }

    /// Abort the capture, discarding all buffered points.
    ///
    /// Returns true when a capture was discarded, in which case the caller
    /// must request a full redraw to erase speculative pixels.
    pub fn pointer_cancel(&mut self, pointer_id: u32) -> bool {
        if self.active_pointer != Some(pointer_id) {
            return false;
        }
        self.active_pointer = None;
        self.buffer.clear();
        self.drawn = 0;
        true
    }

    /// Abort any active capture regardless of owning pointer.
    ///
    /// Returns true when a capture was discarded; used when the overlay is
    /// deactivated mid-stroke.
    pub fn abort(&mut self) -> bool {
        if self.active_pointer.is_none() {
            return false;
        }
        self.active_pointer = None;
        self.buffer.clear();
        self.drawn = 0;
        true
    }

    /// Drain the segments appended since the previous call.
    ///
    /// Each buffered point is yielded exactly once as a segment endpoint, so
    /// an incremental tick never redraws earlier parts of the stroke.
    pub fn take_pending_segments(&mut self) -> Vec<PendingSegment> {
        let mut out = Vec::new();
        while self.drawn + 1 < self.buffer.len() {
            let i = self.drawn;
            out.push(PendingSegment {
                prev: i.checked_sub(1).map(|p| self.buffer[p]),
                from: self.buffer[i],
                to: self.buffer[i + 1],
            });
            self.drawn += 1;
        }
        out
    }
}
