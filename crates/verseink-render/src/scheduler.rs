//! Incremental repaint scheduling during capture.

use crate::surface::SurfaceManager;
use verseink_core::sampler::InputSampler;

/// Scheduler activity state.
///
/// The host subscribes its repaint callback on the Idle -> Capturing
/// transition and unsubscribes on the way back; ticks outside a capture are
/// no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Capturing,
}

/// Cooperative single-threaded draw loop, active only during capture.
///
/// Each tick draws only the segments appended since the previous tick,
/// never the whole history.
#[derive(Debug, Default)]
pub struct RenderScheduler {
    state: SchedulerState,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == SchedulerState::Capturing
    }

    /// Enter capture; subsequent ticks draw incrementally.
    pub fn begin_capture(&mut self) {
        self.state = SchedulerState::Capturing;
    }

    /// Leave capture (pointer-up or cancel); subsequent ticks are no-ops.
    pub fn end_capture(&mut self) {
        self.state = SchedulerState::Idle;
    }

    /// Draw the sampler's newly appended segments onto the surface.
    /// Returns the number of segments drawn.
    pub fn tick(&mut self, sampler: &mut InputSampler, surface: &mut SurfaceManager) -> usize {
        if self.state != SchedulerState::Capturing {
            return 0;
        }
        let segments = sampler.take_pending_segments();
        let (tool, color, size) = (sampler.tool(), sampler.color(), sampler.base_size());
        for seg in &segments {
            surface.draw_segment(seg.prev, seg.from, seg.to, tool, color, size);
        }
        segments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verseink_core::sampler::{PointerDown, PointerKind};
    use verseink_core::stroke::InkPoint;

    fn down(x: f32, y: f32) -> PointerDown {
        PointerDown {
            pointer_id: 1,
            kind: PointerKind::Pen,
            primary: true,
            time_ms: 0.0,
            sample: InkPoint::new(x, y, 0.8),
        }
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let mut scheduler = RenderScheduler::new();
        let mut sampler = InputSampler::new();
        let mut surface = SurfaceManager::new();
        surface.resize(100.0, 100.0, 1.0, &[]);

        sampler.pointer_down(down(10.0, 10.0));
        sampler.pointer_move(1, &[InkPoint::new(20.0, 10.0, 0.8)]);

        assert_eq!(scheduler.tick(&mut sampler, &mut surface), 0);
    }

    #[test]
    fn test_capture_tick_draws_increments() {
        let mut scheduler = RenderScheduler::new();
        let mut sampler = InputSampler::new();
        let mut surface = SurfaceManager::new();
        surface.resize(100.0, 100.0, 1.0, &[]);

        sampler.pointer_down(down(10.0, 50.0));
        scheduler.begin_capture();
        assert!(scheduler.is_capturing());

        sampler.pointer_move(
            1,
            &[InkPoint::new(20.0, 50.0, 0.8), InkPoint::new(30.0, 50.0, 0.8)],
        );
        assert_eq!(scheduler.tick(&mut sampler, &mut surface), 2);
        assert!(surface.surface().alpha_at(20, 50) > 0);

        // Nothing new appended: the next tick draws nothing.
        assert_eq!(scheduler.tick(&mut sampler, &mut surface), 0);

        scheduler.end_capture();
        sampler.pointer_move(1, &[InkPoint::new(40.0, 50.0, 0.8)]);
        assert_eq!(scheduler.tick(&mut sampler, &mut surface), 0);
    }

    #[test]
    fn test_buffer_survives_resize_and_flushes_next_tick() {
        let mut scheduler = RenderScheduler::new();
        let mut sampler = InputSampler::new();
        let mut surface = SurfaceManager::new();
        surface.resize(100.0, 100.0, 1.0, &[]);

        sampler.pointer_down(down(10.0, 30.0));
        scheduler.begin_capture();
        sampler.pointer_move(1, &[InkPoint::new(20.0, 30.0, 0.8)]);
        scheduler.tick(&mut sampler, &mut surface);

        // Surface reallocates mid-stroke; the point buffer is independent.
        surface.resize(120.0, 120.0, 1.0, &[]);
        sampler.pointer_move(1, &[InkPoint::new(30.0, 30.0, 0.8)]);
        assert_eq!(scheduler.tick(&mut sampler, &mut surface), 1);

        let stroke = sampler.pointer_up(1).expect("stroke commits after resize");
        assert_eq!(stroke.len(), 3);
    }
}
