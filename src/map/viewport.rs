//! Pan/zoom transform over the fixed logical canvas of the embedding map.
//!
//! Everything here is pure: each operation returns the next viewport and the
//! caller commits it in one assignment.

use std::ops::{Add, Mul, Sub};

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 10.0;
/// Factor applied by one zoom-in click; zoom-out uses its inverse.
pub const ZOOM_STEP: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Logical canvas dimensions (W, H).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
        }
    }
}

impl CanvasSize {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Logical position of a normalized `[0,1]` coordinate pair.
    pub fn place(&self, nx: f64, ny: f64) -> Vec2 {
        Vec2::new(nx * self.width, ny * self.height)
    }

    pub fn contains(&self, screen: Vec2) -> bool {
        (0.0..=self.width).contains(&screen.x) && (0.0..=self.height).contains(&screen.y)
    }
}

/// Committed view transform: `translate(pan) ∘ scale(scale)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub pan: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: MIN_SCALE,
            pan: Vec2::ZERO,
        }
    }
}

impl Viewport {
    /// Screen position of a logical (data-space) point.
    #[cfg(test)]
    pub fn to_screen(&self, logical: Vec2) -> Vec2 {
        logical * self.scale + self.pan
    }

    /// Logical point currently under a screen position.
    pub fn to_logical(&self, screen: Vec2) -> Vec2 {
        (screen - self.pan) * (1.0 / self.scale)
    }

    /// Zoom by `factor`, keeping the logical point at the canvas center fixed
    /// on screen. Returns `None` when the scale would not change (already at a
    /// bound, or a degenerate factor).
    pub fn zoomed(&self, factor: f64, canvas: CanvasSize) -> Option<Viewport> {
        if !factor.is_finite() || factor <= 0.0 {
            return None;
        }
        let scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if scale == self.scale {
            return None;
        }

        let screen_center = canvas.center();
        let focus = self.to_logical(screen_center);
        Some(Viewport {
            scale,
            pan: screen_center - focus * scale,
        })
    }

    /// Scale indicator text, e.g. `1.0x`.
    pub fn scale_label(&self) -> String {
        format!("{:.1}x", self.scale)
    }
}

/// Drag-to-pan tracking. Pan follows the pointer 1:1 in screen pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct DragState {
    anchor: Option<Vec2>,
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn begin(&mut self, pointer: Vec2, viewport: &Viewport) {
        self.anchor = Some(pointer - viewport.pan);
    }

    /// New pan offset for a pointer move, or `None` when not dragging.
    pub fn pan_for(&self, pointer: Vec2) -> Option<Vec2> {
        self.anchor.map(|anchor| pointer - anchor)
    }

    pub fn end(&mut self) {
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    #[test]
    fn test_zoom_saturates_at_max() {
        let canvas = CanvasSize::default();
        let mut vp = Viewport::default();
        let mut steps = 0;
        while let Some(next) = vp.zoomed(ZOOM_STEP, canvas) {
            assert!(next.scale >= MIN_SCALE && next.scale <= MAX_SCALE);
            vp = next;
            steps += 1;
            assert!(steps < 20, "zoom never saturated");
        }
        assert_eq!(vp.scale, MAX_SCALE);
        assert!(vp.zoomed(ZOOM_STEP, canvas).is_none());
    }

    #[test]
    fn test_zoom_out_at_min_is_noop() {
        let vp = Viewport::default();
        assert!(vp.zoomed(1.0 / ZOOM_STEP, CanvasSize::default()).is_none());
    }

    #[test]
    fn test_zoom_rejects_degenerate_factor() {
        let canvas = CanvasSize::default();
        let vp = Viewport::default();
        assert!(vp.zoomed(f64::NAN, canvas).is_none());
        assert!(vp.zoomed(0.0, canvas).is_none());
        assert!(vp.zoomed(-2.0, canvas).is_none());
    }

    #[test]
    fn test_zoom_keeps_center_point_fixed() {
        let canvas = CanvasSize::default();
        let vp = Viewport {
            scale: 2.0,
            pan: Vec2::new(-137.0, 42.5),
        };
        let focus = vp.to_logical(canvas.center());
        assert!(close(vp.to_screen(focus), canvas.center()));

        for factor in [ZOOM_STEP, 1.0 / ZOOM_STEP, 3.7, 0.2] {
            let next = vp.zoomed(factor, canvas).unwrap();
            assert!(
                close(next.to_screen(focus), canvas.center()),
                "factor {} moved the focal point",
                factor
            );
        }
    }

    #[test]
    fn test_first_zoom_from_identity() {
        let canvas = CanvasSize::default();
        let next = Viewport::default().zoomed(ZOOM_STEP, canvas).unwrap();
        assert_eq!(next.scale, 1.5);
        // Center (300, 200) stays put: pan = center - center * 1.5
        assert!(close(next.pan, Vec2::new(-150.0, -100.0)));
    }

    #[test]
    fn test_drag_changes_pan_by_pointer_delta() {
        let vp = Viewport {
            scale: 3.0,
            pan: Vec2::new(10.0, -20.0),
        };
        let mut drag = DragState::default();
        let a = Vec2::new(100.0, 100.0);
        let b = Vec2::new(160.0, 75.0);
        drag.begin(a, &vp);
        let pan = drag.pan_for(b).unwrap();
        assert!(close(pan - vp.pan, b - a));
        drag.end();
        assert!(drag.pan_for(b).is_none());
    }

    #[test]
    fn test_canvas_contains_edges() {
        let canvas = CanvasSize::default();
        assert!(canvas.contains(Vec2::new(0.0, 0.0)));
        assert!(canvas.contains(Vec2::new(600.0, 400.0)));
        assert!(!canvas.contains(Vec2::new(600.5, 10.0)));
        assert!(!canvas.contains(Vec2::new(10.0, -1.0)));
    }

    #[test]
    fn test_scale_label_rounds_to_one_decimal() {
        let vp = Viewport {
            scale: 2.26,
            pan: Vec2::ZERO,
        };
        assert_eq!(Viewport::default().scale_label(), "1.0x");
        assert_eq!(vp.scale_label(), "2.3x");
        assert_eq!(
            Viewport {
                scale: 3.375,
                pan: Vec2::ZERO
            }
            .scale_label(),
            "3.4x"
        );
    }
}
