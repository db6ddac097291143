//! Overlay composition: visual modes and the host command surface.

use crate::scheduler::RenderScheduler;
use crate::surface::SurfaceManager;
use image::RgbaImage;
use verseink_core::document::MAX_MARGIN_EXTENSION;
use verseink_core::sampler::{DownOutcome, InputSampler, PointerDown};
use verseink_core::store::{StrokePayload, StrokeStore};
use verseink_core::stroke::{InkColor, InkPoint, Tool};

/// Alpha multiplier for the read-only replay presentation.
pub const READONLY_OPACITY: f32 = 0.5;

/// Visual/interaction mode of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    /// No stroke data and zero margin extension; nothing is rendered.
    #[default]
    Hidden,
    /// Has data; rendered faint, not interactive, blocks no input.
    ReadOnlyReplay,
    /// Capturing input; intercepts pointer/selection events.
    ActiveEdit,
}

type ChangeListener = Box<dyn FnMut(&str)>;

/// Composes sampler, scheduler, surface and store into the annotation
/// overlay the host embeds over its text view.
///
/// Persistence stays outside: the host owns a `PersistenceBridge` and reacts
/// to `on_change`, which fires exactly once per completed stroke.
pub struct AnnotationOverlay {
    mode: OverlayMode,
    sampler: InputSampler,
    scheduler: RenderScheduler,
    surface: SurfaceManager,
    store: StrokeStore,
    margin_extension: f32,
    on_change: Option<ChangeListener>,
}

impl Default for AnnotationOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationOverlay {
    pub fn new() -> Self {
        Self {
            mode: OverlayMode::Hidden,
            sampler: InputSampler::new(),
            scheduler: RenderScheduler::new(),
            surface: SurfaceManager::new(),
            store: StrokeStore::new(),
            margin_extension: 0.0,
            on_change: None,
        }
    }

    pub fn mode(&self) -> OverlayMode {
        self.mode
    }

    /// Whether the overlay intercepts pointer/selection events from the
    /// underlying text.
    pub fn blocks_input(&self) -> bool {
        self.mode == OverlayMode::ActiveEdit
    }

    /// Register the host notification fired once per completed stroke.
    pub fn set_on_change(&mut self, listener: ChangeListener) {
        self.on_change = Some(listener);
    }

    pub fn strokes(&self) -> &StrokeStore {
        &self.store
    }

    pub fn margin_extension(&self) -> f32 {
        self.margin_extension
    }

    fn has_content(&self) -> bool {
        !self.store.is_empty() || self.margin_extension > 0.0
    }

    // Host commands ---------------------------------------------------------

    /// Enter edit mode, first loading stored strokes into the live surface.
    pub fn activate(&mut self, stored: Option<&str>) {
        if let Some(data) = stored {
            self.load_strokes(data);
        }
        self.mode = OverlayMode::ActiveEdit;
    }

    /// Leave edit mode. Any in-progress capture is aborted and its
    /// speculative pixels erased.
    pub fn deactivate(&mut self) {
        if self.sampler.abort() {
            self.scheduler.end_capture();
            self.surface.redraw(self.store.strokes());
        }
        self.mode = if self.has_content() {
            OverlayMode::ReadOnlyReplay
        } else {
            OverlayMode::Hidden
        };
    }

    /// Clear-all: empty the history, wipe the surface, reset the margin.
    pub fn clear(&mut self) {
        self.sampler.abort();
        self.scheduler.end_capture();
        self.store.clear();
        self.surface.clear();
        self.margin_extension = 0.0;
        self.mode = OverlayMode::Hidden;
    }

    /// Remove the most recent stroke and rebuild the surface.
    /// A no-op on an empty history.
    pub fn undo(&mut self) {
        if self.store.undo() {
            self.surface.redraw(self.store.strokes());
        }
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.sampler.set_tool(tool);
    }

    pub fn set_color(&mut self, color: InkColor) {
        self.sampler.set_color(color);
    }

    pub fn set_size(&mut self, size: f32) {
        self.sampler.set_base_size(size);
    }

    pub fn tool(&self) -> Tool {
        self.sampler.tool()
    }

    /// Canonical serialized stroke list for the host.
    pub fn serialized_data(&self) -> String {
        match self.store.serialize() {
            Ok(data) => data,
            Err(err) => {
                log::warn!("stroke serialization failed: {err}");
                "[]".to_string()
            }
        }
    }

    /// Full redraw of the committed history.
    pub fn redraw(&mut self) {
        self.surface.redraw(self.store.strokes());
    }

    /// Load persisted stroke data, degrading gracefully on malformed input.
    pub fn load_strokes(&mut self, data: &str) {
        match StrokePayload::decode(data) {
            StrokePayload::Strokes(strokes) => {
                self.store.replace(strokes);
                self.redraw();
            }
            StrokePayload::Raster(url) => {
                self.store.replace(Vec::new());
                self.surface.clear();
                if let Err(err) = self.surface.blit_data_url(&url) {
                    log::warn!("legacy raster payload could not be decoded: {err}");
                }
            }
            StrokePayload::Empty => {
                self.store.replace(Vec::new());
                self.surface.clear();
            }
        }
    }

    /// Drag the extra-writing-space margin by `delta` logical pixels.
    /// Returns the clamped extension.
    pub fn drag_margin(&mut self, delta: f32) -> f32 {
        self.margin_extension = (self.margin_extension + delta).clamp(0.0, MAX_MARGIN_EXTENSION);
        self.margin_extension
    }

    /// Observed element size or device-pixel-ratio change.
    ///
    /// The committed history is replayed onto the reallocated surface; an
    /// in-progress stroke's buffered points are unaffected and flush on the
    /// next tick.
    pub fn resize(&mut self, logical_width: f32, logical_height: f32, scale_factor: f32) {
        self.surface.resize(
            logical_width,
            logical_height,
            scale_factor,
            self.store.strokes(),
        );
    }

    // Pointer path ----------------------------------------------------------

    /// Forward pointer-down. Only ActiveEdit accepts input.
    pub fn pointer_down(&mut self, evt: PointerDown) -> DownOutcome {
        if self.mode != OverlayMode::ActiveEdit {
            return DownOutcome::Rejected;
        }
        let outcome = self.sampler.pointer_down(evt);
        if outcome == DownOutcome::CaptureStarted {
            self.scheduler.begin_capture();
        }
        outcome
    }

    /// Forward coalesced move samples of the capturing pointer.
    pub fn pointer_move(&mut self, pointer_id: u32, samples: &[InkPoint]) {
        self.sampler.pointer_move(pointer_id, samples);
    }

    /// One repaint-cycle tick; draws newly appended segments while capturing.
    pub fn tick(&mut self) -> usize {
        self.scheduler
            .tick(&mut self.sampler, &mut self.surface)
    }

    /// Finish the capture. Commits the stroke (when it has >= 2 points),
    /// appends it to the history and notifies the host once.
    /// Returns true when a stroke was committed.
    pub fn pointer_up(&mut self, pointer_id: u32) -> bool {
        // Flush samples that arrived since the last tick before the
        // scheduler unsubscribes.
        self.scheduler.tick(&mut self.sampler, &mut self.surface);

        let committed = self.sampler.pointer_up(pointer_id);
        if !self.sampler.is_capturing() {
            self.scheduler.end_capture();
        }

        let Some(stroke) = committed else {
            return false;
        };
        self.store.append(stroke);
        let data = self.serialized_data();
        if let Some(listener) = self.on_change.as_mut() {
            listener(&data);
        }
        true
    }

    /// Abort the capture, discarding buffered points and erasing any pixels
    /// already drawn incrementally for the aborted stroke.
    pub fn pointer_cancel(&mut self, pointer_id: u32) {
        if self.sampler.pointer_cancel(pointer_id) {
            self.scheduler.end_capture();
            self.surface.redraw(self.store.strokes());
        }
    }

    // Presentation ----------------------------------------------------------

    /// Compose the overlay for the host: nothing when hidden, a faint replay
    /// in read-only mode, the live surface while editing.
    pub fn composite(&self) -> Option<RgbaImage> {
        match self.mode {
            OverlayMode::Hidden => None,
            OverlayMode::ReadOnlyReplay => Some(self.surface.faded_snapshot(READONLY_OPACITY)),
            OverlayMode::ActiveEdit => Some(self.surface.snapshot()),
        }
    }

    pub fn surface(&self) -> &SurfaceManager {
        &self.surface
    }
}
