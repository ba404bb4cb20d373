//! Viewport: the pan/zoom transform between canvas space and screen space.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;

/// Step used by the zoom-in / zoom-out commands.
pub const ZOOM_STEP: f64 = 1.2;

/// Wheel delta to zoom factor.
pub const WHEEL_ZOOM_SENSITIVITY: f64 = 0.001;

/// Pan offset (screen pixels) and zoom factor.
///
/// `screen = canvas * zoom + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub offset: Vec2,
    pub zoom: f64,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
}

fn default_min_zoom() -> f64 {
    MIN_ZOOM
}

fn default_max_zoom() -> f64 {
    MAX_ZOOM
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

/// Partial viewport update; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportPatch {
    pub offset_x: Option<f64>,
    pub offset_y: Option<f64>,
    pub zoom: Option<f64>,
}

impl ViewportPatch {
    pub fn offset(offset: Vec2) -> Self {
        Self {
            offset_x: Some(offset.x),
            offset_y: Some(offset.y),
            zoom: None,
        }
    }

    pub fn zoom(zoom: f64) -> Self {
        Self {
            zoom: Some(zoom),
            ..Self::default()
        }
    }
}

impl Viewport {
    pub fn new(offset: Vec2, zoom: f64) -> Self {
        Self {
            offset,
            zoom,
            ..Self::default()
        }
    }

    /// Canvas to screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Screen to canvas transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.zoom,
            (screen.y - self.offset.y) / self.zoom,
        )
    }

    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point::new(
            canvas.x * self.zoom + self.offset.x,
            canvas.y * self.zoom + self.offset.y,
        )
    }

    /// Merge a partial update. Zoom is clamped to the allowed range.
    pub fn apply(&mut self, patch: ViewportPatch) {
        if let Some(x) = patch.offset_x {
            self.offset.x = x;
        }
        if let Some(y) = patch.offset_y {
            self.offset.y = y;
        }
        if let Some(zoom) = patch.zoom {
            self.zoom = self.clamp_zoom(zoom);
        }
    }

    /// Pan by a delta in screen pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Set the allowed zoom range. Limits that are not finite and positive
    /// fall back to the defaults; reversed limits are swapped.
    pub fn set_zoom_limits(&mut self, min: f64, max: f64) {
        let valid = |z: f64| z.is_finite() && z > 0.0;
        let min = if valid(min) { min } else { MIN_ZOOM };
        let max = if valid(max) { max } else { MAX_ZOOM };
        (self.min_zoom, self.max_zoom) = if min <= max { (min, max) } else { (max, min) };
        self.zoom = self.clamp_zoom(self.zoom);
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        if !zoom.is_finite() {
            return self.zoom;
        }
        // Deserialized limits may be inverted or NaN, where `f64::clamp` panics.
        zoom.max(self.min_zoom).min(self.max_zoom)
    }

    /// Zoom by `factor`, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = self.clamp_zoom(self.zoom * factor);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let canvas_point = self.screen_to_canvas(screen_point);
        self.zoom = new_zoom;
        let moved = self.canvas_to_screen(canvas_point);
        self.offset += screen_point - moved;
    }

    /// Mouse-wheel zoom around the pointer. Negative delta zooms in.
    pub fn wheel_zoom(&mut self, screen_point: Point, delta_y: f64) {
        let factor = 1.0 - delta_y * WHEEL_ZOOM_SENSITIVITY;
        if factor > 0.0 {
            self.zoom_at(screen_point, factor);
        }
    }

    /// Zoom in one step around the given screen point (usually the view center).
    pub fn zoom_in(&mut self, center: Point) {
        self.zoom_at(center, ZOOM_STEP);
    }

    pub fn zoom_out(&mut self, center: Point) {
        self.zoom_at(center, 1.0 / ZOOM_STEP);
    }

    /// Back to the identity view.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// Zoom as a whole percentage, for status display.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_limits_are_sanitized() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(5.0, 0.1);
        assert!((viewport.min_zoom - 0.1).abs() < f64::EPSILON);
        assert!((viewport.max_zoom - 5.0).abs() < f64::EPSILON);

        viewport.set_zoom_limits(f64::NAN, -2.0);
        assert!((viewport.min_zoom - MIN_ZOOM).abs() < f64::EPSILON);
        assert!((viewport.max_zoom - MAX_ZOOM).abs() < f64::EPSILON);

        viewport.set_zoom_limits(2.0, 3.0);
        assert!((viewport.zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_inverted_limits_do_not_panic() {
        let mut viewport = Viewport {
            min_zoom: 5.0,
            max_zoom: 0.1,
            ..Viewport::default()
        };
        viewport.wheel_zoom(Point::ZERO, -100.0);
        assert!(viewport.zoom.is_finite());
    }

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::default();
        assert_eq!(viewport.offset, Vec2::ZERO);
        assert!((viewport.zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_canvas_with_offset_and_zoom() {
        let viewport = Viewport::new(Vec2::new(50.0, 100.0), 2.0);
        let canvas = viewport.screen_to_canvas(Point::new(150.0, 300.0));
        assert!((canvas.x - 50.0).abs() < f64::EPSILON);
        assert!((canvas.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let viewport = Viewport::new(Vec2::new(30.0, -20.0), 1.5);
        let original = Point::new(123.0, 456.0);
        let back = viewport.canvas_to_screen(viewport.screen_to_canvas(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_transform_matches_conversion() {
        let viewport = Viewport::new(Vec2::new(7.0, 9.0), 3.0);
        let p = Point::new(2.0, 5.0);
        let a = viewport.transform() * p;
        let b = viewport.canvas_to_screen(p);
        assert!((a.x - b.x).abs() < 1e-10);
        assert!((a.y - b.y).abs() < 1e-10);
        let back = viewport.inverse_transform() * a;
        assert!((back.x - p.x).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut viewport = Viewport::default();
        viewport.zoom_at(Point::ZERO, 0.001);
        assert!((viewport.zoom - MIN_ZOOM).abs() < f64::EPSILON);

        viewport.zoom_at(Point::ZERO, 1000.0);
        assert!((viewport.zoom - MAX_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut viewport = Viewport::new(Vec2::new(10.0, 10.0), 1.0);
        let anchor = Point::new(200.0, 150.0);
        let before = viewport.screen_to_canvas(anchor);
        viewport.zoom_at(anchor, 2.0);
        let after = viewport.screen_to_canvas(anchor);
        assert!((before.x - after.x).abs() < 1e-10);
        assert!((before.y - after.y).abs() < 1e-10);
    }

    #[test]
    fn test_wheel_zoom_direction() {
        let mut viewport = Viewport::default();
        viewport.wheel_zoom(Point::ZERO, -100.0);
        assert!(viewport.zoom > 1.0);
        viewport.reset();
        viewport.wheel_zoom(Point::ZERO, 100.0);
        assert!(viewport.zoom < 1.0);
    }

    #[test]
    fn test_apply_patch() {
        let mut viewport = Viewport::default();
        viewport.apply(ViewportPatch {
            offset_x: Some(5.0),
            ..ViewportPatch::default()
        });
        assert!((viewport.offset.x - 5.0).abs() < f64::EPSILON);
        assert!(viewport.offset.y.abs() < f64::EPSILON);

        viewport.apply(ViewportPatch::zoom(42.0));
        assert!((viewport.zoom - MAX_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan() {
        let mut viewport = Viewport::default();
        viewport.pan(Vec2::new(10.0, 20.0));
        assert!((viewport.offset.x - 10.0).abs() < f64::EPSILON);
        assert!((viewport.offset.y - 20.0).abs() < f64::EPSILON);
    }
}
