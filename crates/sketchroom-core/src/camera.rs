//! Camera module for the per-client pan/zoom view.
//!
//! The camera maps between "true" model coordinates, in which strokes are
//! stored and shared, and screen coordinates, in which pointer input arrives
//! and lines are drawn:
//!
//! ```text
//! screen = (true + offset) * scale
//! true   = screen / scale - offset
//! ```

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Wheel delta that corresponds to a 100% zoom change.
pub const ZOOM_SENSITIVITY: f64 = 500.0;

/// Largest fraction of the current scale a single wheel event may remove.
///
/// Keeps `1 + scale_amount` at or above `0.1`, so the scale can never reach
/// zero or flip sign no matter how large the wheel delta is.
pub const MAX_ZOOM_OUT_STEP: f64 = 0.9;

/// View transform of one client. Never shared with other room members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Pan offset, in model units.
    pub offset: Vec2,
    /// Zoom factor (screen pixels per model unit).
    pub scale: f64,
    /// Minimum allowed scale.
    pub min_scale: f64,
    /// Maximum allowed scale.
    pub max_scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            min_scale: 0.05,
            max_scale: 50.0,
        }
    }
}

impl Camera {
    /// Create a new camera with an identity view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the affine transform for rendering (true -> screen).
    pub fn transform(&self) -> Affine {
        Affine::scale(self.scale) * Affine::translate(self.offset)
    }

    /// Get the inverse transform for input handling (screen -> true).
    pub fn inverse_transform(&self) -> Affine {
        Affine::translate(-self.offset) * Affine::scale(1.0 / self.scale)
    }

    /// Convert a true (model) point to screen coordinates.
    pub fn to_screen(&self, point: Point) -> Point {
        self.transform() * point
    }

    /// Convert a screen point to true (model) coordinates.
    pub fn to_true(&self, point: Point) -> Point {
        self.inverse_transform() * point
    }

    /// Pan by a delta measured in screen pixels.
    pub fn pan(&mut self, screen_delta: Vec2) {
        self.offset += screen_delta / self.scale;
    }

    /// Scale change requested by a wheel delta, clamped so the zoom factor
    /// `1 + amount` stays positive.
    pub fn scale_amount(delta_y: f64) -> f64 {
        (-delta_y / ZOOM_SENSITIVITY).max(-MAX_ZOOM_OUT_STEP)
    }

    /// Zoom in response to a wheel event, keeping the model point under the
    /// pointer at the same screen position.
    ///
    /// Negative `delta_y` (scrolling up) zooms in, positive zooms out.
    pub fn zoom_at(&mut self, pointer: Point, delta_y: f64, viewport: Size) {
        if !delta_y.is_finite() || viewport.width <= 0.0 || viewport.height <= 0.0 {
            return;
        }

        let old_scale = self.scale;
        let new_scale = (old_scale * (1.0 + Self::scale_amount(delta_y)))
            .clamp(self.min_scale, self.max_scale);
        if (new_scale - old_scale).abs() < f64::EPSILON {
            return;
        }
        self.scale = new_scale;

        // Pointer position as a fraction of the viewport, and how many model
        // units the viewport lost (or gained) along each axis.
        let fraction = Vec2::new(pointer.x / viewport.width, pointer.y / viewport.height);
        let units_lost = Vec2::new(
            viewport.width / old_scale - viewport.width / new_scale,
            viewport.height / old_scale - viewport.height / new_scale,
        );

        self.offset -= Vec2::new(units_lost.x * fraction.x, units_lost.y * fraction.y);
    }

    /// Reset camera to the identity view.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(a: Point, b: Point, tolerance: f64) {
        assert!(
            (a.x - b.x).abs() < tolerance && (a.y - b.y).abs() < tolerance,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_default_camera_is_identity() {
        let camera = Camera::new();
        let point = Point::new(100.0, 200.0);
        assert_point_eq(camera.to_screen(point), point, f64::EPSILON);
        assert_point_eq(camera.to_true(point), point, f64::EPSILON);
    }

    #[test]
    fn test_to_screen_formula() {
        let camera = Camera {
            offset: Vec2::new(10.0, -5.0),
            scale: 2.0,
            ..Camera::default()
        };
        let screen = camera.to_screen(Point::new(1.0, 2.0));
        assert_point_eq(screen, Point::new(22.0, -6.0), 1e-12);

        let back = camera.to_true(Point::new(22.0, -6.0));
        assert_point_eq(back, Point::new(1.0, 2.0), 1e-12);
    }

    #[test]
    fn test_inverse_law() {
        let views = [
            (Vec2::new(0.0, 0.0), 1.0),
            (Vec2::new(30.0, -20.0), 1.5),
            (Vec2::new(-1234.5, 987.25), 0.07),
            (Vec2::new(3.0, 4.0), 42.0),
        ];
        let points = [
            Point::new(0.0, 0.0),
            Point::new(123.0, 456.0),
            Point::new(-77.7, 0.001),
        ];

        for (offset, scale) in views {
            let camera = Camera { offset, scale, ..Camera::default() };
            for point in points {
                let round_trip = camera.to_true(camera.to_screen(point));
                assert_point_eq(round_trip, point, 1e-9);
            }
        }
    }

    #[test]
    fn test_pan_divides_by_scale() {
        let mut camera = Camera::new();
        camera.scale = 2.0;
        camera.pan(Vec2::new(10.0, 20.0));
        assert!((camera.offset.x - 5.0).abs() < f64::EPSILON);
        assert!((camera.offset.y - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan_moves_content_with_pointer() {
        let mut camera = Camera::new();
        camera.scale = 3.0;
        let anchor = Point::new(50.0, 50.0);
        let model = camera.to_true(anchor);

        camera.pan(Vec2::new(12.0, -8.0));
        assert_point_eq(camera.to_screen(model), Point::new(62.0, 42.0), 1e-9);
    }

    #[test]
    fn test_wheel_up_doubles_scale_at_center() {
        let mut camera = Camera::new();
        let viewport = Size::new(800.0, 600.0);
        let center = Point::new(400.0, 300.0);
        let model = camera.to_true(center);

        camera.zoom_at(center, -500.0, viewport);

        assert!((camera.scale - 2.0).abs() < 1e-12);
        assert_point_eq(camera.to_screen(model), center, 1e-9);
    }

    #[test]
    fn test_zoom_keeps_arbitrary_pointer_fixed() {
        let mut camera = Camera {
            offset: Vec2::new(-40.0, 25.0),
            scale: 1.7,
            ..Camera::default()
        };
        let viewport = Size::new(1280.0, 800.0);
        let pointer = Point::new(97.0, 611.0);
        let model = camera.to_true(pointer);

        camera.zoom_at(pointer, 120.0, viewport);
        assert!(camera.scale < 1.7);
        assert_point_eq(camera.to_screen(model), pointer, 1e-9);

        camera.zoom_at(pointer, -300.0, viewport);
        assert_point_eq(camera.to_screen(model), pointer, 1e-9);
    }

    #[test]
    fn test_extreme_wheel_delta_keeps_scale_positive() {
        let mut camera = Camera::new();
        let viewport = Size::new(800.0, 600.0);

        camera.zoom_at(Point::new(10.0, 10.0), 1e12, viewport);
        assert!(camera.scale > 0.0);
        assert!((camera.scale - 0.1).abs() < 1e-12);

        for _ in 0..100 {
            camera.zoom_at(Point::new(10.0, 10.0), 1e12, viewport);
        }
        assert!((camera.scale - camera.min_scale).abs() < f64::EPSILON);

        let model = camera.to_true(Point::new(10.0, 10.0));
        assert!(model.x.is_finite() && model.y.is_finite());
    }

    #[test]
    fn test_zoom_in_clamped_to_max() {
        let mut camera = Camera::new();
        for _ in 0..100 {
            camera.zoom_at(Point::ZERO, -1e6, Size::new(100.0, 100.0));
        }
        assert!((camera.scale - camera.max_scale).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scale_amount_clamp() {
        assert!((Camera::scale_amount(-500.0) - 1.0).abs() < f64::EPSILON);
        assert!((Camera::scale_amount(250.0) + 0.5).abs() < f64::EPSILON);
        assert!((Camera::scale_amount(f64::MAX) + MAX_ZOOM_OUT_STEP).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_finite_wheel_is_ignored() {
        let mut camera = Camera::new();
        camera.zoom_at(Point::new(1.0, 1.0), f64::NAN, Size::new(100.0, 100.0));
        assert_eq!(camera, Camera::new());
    }

    #[test]
    fn test_reset() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(5.0, 5.0));
        camera.zoom_at(Point::ZERO, -100.0, Size::new(10.0, 10.0));
        camera.reset();
        assert_eq!(camera.offset, Vec2::ZERO);
        assert!((camera.scale - 1.0).abs() < f64::EPSILON);
    }
}
