#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

pub use protocol::Point;

use crate::consts::{MAX_ZOOM, MIN_ZOOM};

/// Pan/zoom view onto the unbounded canvas.
///
/// `pan_x` / `pan_y` are screen pixels; `zoom` is a scale factor
/// (1.0 = no zoom) kept within [`MIN_ZOOM`, `MAX_ZOOM`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point to canvas coordinates. Pressure is carried over.
    #[must_use]
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
            pressure: screen.pressure,
        }
    }

    /// Convert a canvas-space point to screen coordinates.
    #[must_use]
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point {
            x: canvas.x * self.zoom + self.pan_x,
            y: canvas.y * self.zoom + self.pan_y,
            pressure: canvas.pressure,
        }
    }

    /// Convert a screen-space distance (pixels) to canvas units.
    #[must_use]
    pub fn screen_dist_to_canvas(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Shift the view by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Multiply zoom by `factor` while keeping the canvas point under
    /// `screen` fixed. Returns `false` when the clamped zoom is unchanged.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let new_zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return false;
        }
        let anchor = self.screen_to_canvas(screen);
        self.zoom = new_zoom;
        self.pan_x = screen.x - anchor.x * new_zoom;
        self.pan_y = screen.y - anchor.y * new_zoom;
        true
    }

    /// Back to the identity view.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
