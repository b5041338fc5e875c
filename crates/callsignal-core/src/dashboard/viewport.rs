//! Zoom and pan window over the sentiment series.
//!
//! The window is described by its width in points and its distance from the
//! live edge. `end_offset == 0` means the view follows new data.

use std::ops::Range;

pub const DEFAULT_WINDOW: usize = 60;
pub const MIN_WINDOW: usize = 10;
pub const ZOOM_INTENSITY: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    window_size: usize,
    end_offset: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW,
            end_offset: 0,
        }
    }
}

impl Viewport {
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn end_offset(&self) -> usize {
        self.end_offset
    }

    pub fn is_live(&self) -> bool {
        self.end_offset == 0
    }

    /// Zooms in for a positive `delta`, out for a negative one, keeping the
    /// point under `cursor_ratio` (0 = left edge, 1 = right edge) in place.
    /// No-op with fewer than two points.
    pub fn zoom(&mut self, delta: f64, cursor_ratio: f64, len: usize) {
        if len < 2 || delta == 0.0 {
            return;
        }
        let cursor_ratio = cursor_ratio.clamp(0.0, 1.0);
        let factor = if delta > 0.0 {
            1.0 - ZOOM_INTENSITY
        } else {
            1.0 + ZOOM_INTENSITY
        };

        let new_window = ((self.window_size as f64 * factor).round() as usize)
            .min(len)
            .max(MIN_WINDOW);

        let len_f = len as f64;
        let start = len_f - self.end_offset as f64 - self.window_size as f64;
        let under_cursor = start + self.window_size as f64 * cursor_ratio;
        let new_start = under_cursor - new_window as f64 * cursor_ratio;
        let new_end = len_f - new_start - new_window as f64;

        self.window_size = new_window;
        self.end_offset = clamp_offset(new_end.round(), len, new_window);
    }

    /// Shifts the window `points` back in time (negative moves toward live).
    pub fn pan(&mut self, points: f64, len: usize) {
        let target = self.end_offset as f64 + points;
        self.end_offset = clamp_offset(target.round(), len, self.window_size);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Keeps a scrolled-back view anchored when `appended` points arrive.
    pub fn on_data_appended(&mut self, appended: usize) {
        if self.end_offset > 0 {
            self.end_offset += appended;
        }
    }

    /// Index range of the visible points; never empty unless `len == 0`.
    pub fn visible_range(&self, len: usize) -> Range<usize> {
        if len == 0 {
            return 0..0;
        }
        let start = len.saturating_sub(self.end_offset + self.window_size);
        let end = len.saturating_sub(self.end_offset).max(start + 1).min(len);
        start..end
    }
}

fn clamp_offset(offset: f64, len: usize, window: usize) -> usize {
    let max = len.saturating_sub(window) as f64;
    offset.clamp(0.0, max) as usize
}
