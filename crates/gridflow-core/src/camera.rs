//! Camera module for stage pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::grid;

/// Multiplicative zoom factor applied per wheel notch.
pub const SCALE_BY: f64 = 1.05;

/// Camera manages the stage transform for the canvas.
///
/// The stage is translated by `offset` (screen pixels) and scaled by `zoom`.
/// The unscaled viewport rectangle it exposes drives grid generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan)
    pub offset: Vec2,
    /// Current zoom level (1.0 = 100%)
    pub zoom: f64,
    /// Minimum allowed zoom level
    pub min_zoom: f64,
    /// Maximum allowed zoom level
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.05,
            max_zoom: 8.0,
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// World-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Screen-to-world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom the camera, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.screen_to_world(screen_point);
        self.zoom = new_zoom;

        // Keep world_point under the cursor
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
    }

    /// Apply one wheel step at the pointer. Positive `delta_y` zooms out.
    pub fn wheel_zoom(&mut self, screen_point: Point, delta_y: f64) {
        if delta_y == 0.0 {
            return;
        }
        let factor = if delta_y > 0.0 { 1.0 / SCALE_BY } else { SCALE_BY };
        self.zoom_at(screen_point, factor);
    }

    /// The unscaled world rectangle visible in a container of the given size.
    pub fn view_rect(&self, container: Size) -> Rect {
        let top_left = self.screen_to_world(Point::ZERO);
        let bottom_right = self.screen_to_world(Point::new(container.width, container.height));
        Rect::from_points(top_left, bottom_right)
    }

    /// Grid density reduction for the current zoom.
    pub fn zoom_step(&self) -> u32 {
        grid::zoom_step(self.zoom)
    }

    /// Pan in response to a scroll gesture (content follows the fingers).
    pub fn scroll(&mut self, delta: Vec2) {
        self.pan(-delta);
    }

    /// Origin for a new block of `size` centered in the visible area.
    pub fn centered_position(&self, container: Size, size: Size) -> Point {
        centered_in(self.view_rect(container), size)
    }

    /// Reset camera to default position and zoom.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }
}

/// Origin that centers a box of `size` inside `view`.
pub fn centered_in(view: Rect, size: Size) -> Point {
    view.center() - Vec2::new(size.width / 2.0, size.height / 2.0)
}
