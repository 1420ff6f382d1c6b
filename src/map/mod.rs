pub mod scene;
pub mod viewport;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::api::types::{MapPoint, QueryPoint, VisData};
use scene::MapScene;
use viewport::{CanvasSize, DragState, Vec2, Viewport, ZOOM_STEP};

/// Server-projected points for the semantic map. Coordinates are already
/// normalized; the client only draws them.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationPayload {
    pub points: Vec<MapPoint>,
    pub query: Option<QueryPoint>,
}

impl VisualizationPayload {
    /// `None` when the block carries no point list.
    pub fn from_vis_data(vis: VisData) -> Option<Self> {
        let points = vis.map_points?;
        Some(Self {
            points,
            query: vis.query_point,
        })
    }

    pub fn marker_count(&self) -> usize {
        self.points.len() + usize::from(self.query.is_some())
    }
}

/// Interactive scatter plot over one payload. A new view always starts from
/// the identity viewport.
pub struct EmbeddingMapView {
    payload: VisualizationPayload,
    canvas: CanvasSize,
    viewport: Viewport,
    drag: DragState,
}

impl EmbeddingMapView {
    pub fn new(payload: VisualizationPayload, canvas: CanvasSize) -> Self {
        Self {
            payload,
            canvas,
            viewport: Viewport::default(),
            drag: DragState::default(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn payload(&self) -> &VisualizationPayload {
        &self.payload
    }

    /// Returns false when already at a zoom bound.
    pub fn zoom(&mut self, factor: f64) -> bool {
        match self.viewport.zoomed(factor, self.canvas) {
            Some(next) => {
                debug!(from = self.viewport.scale, to = next.scale, "zoom");
                self.viewport = next;
                true
            }
            None => false,
        }
    }

    pub fn zoom_in(&mut self) -> bool {
        self.zoom(ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.zoom(1.0 / ZOOM_STEP)
    }

    pub fn reset(&mut self) {
        self.viewport = Viewport::default();
    }

    pub fn pointer_down(&mut self, pointer: Vec2) {
        self.drag.begin(pointer, &self.viewport);
    }

    pub fn pointer_move(&mut self, pointer: Vec2) {
        if let Some(pan) = self.drag.pan_for(pointer) {
            self.viewport.pan = pan;
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag.end();
    }

    pub fn pointer_leave(&mut self) {
        self.drag.end();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Whether a screen position lies on the canvas.
    pub fn contains(&self, pointer: Vec2) -> bool {
        self.canvas.contains(pointer)
    }

    pub fn scale_label(&self) -> String {
        self.viewport.scale_label()
    }

    pub fn scene(&self) -> MapScene {
        MapScene::build(&self.payload, self.canvas, self.viewport)
    }

    pub fn export_svg(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.scene().to_svg())
            .with_context(|| format!("Failed to write map to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Ordinal;

    fn view() -> EmbeddingMapView {
        let payload = VisualizationPayload {
            points: vec![MapPoint {
                x: 0.1,
                y: 0.9,
                madde: Ordinal::Number(17),
                source: "Anayasa".to_string(),
            }],
            query: Some(QueryPoint { x: 0.4, y: 0.4 }),
        };
        EmbeddingMapView::new(payload, CanvasSize::default())
    }

    #[test]
    fn test_vis_data_without_points_is_absent() {
        let vis = VisData {
            map_points: None,
            query_point: Some(QueryPoint { x: 0.5, y: 0.5 }),
        };
        assert!(VisualizationPayload::from_vis_data(vis).is_none());
    }

    #[test]
    fn test_new_view_starts_at_identity() {
        let v = view();
        assert_eq!(v.viewport(), Viewport::default());
        assert_eq!(v.scale_label(), "1.0x");
        assert_eq!(v.payload().marker_count(), 2);
    }

    #[test]
    fn test_reset_after_zoom_and_drag() {
        let mut v = view();
        v.zoom_in();
        v.zoom_in();
        v.pointer_down(Vec2::new(10.0, 10.0));
        v.pointer_move(Vec2::new(90.0, -30.0));
        v.pointer_up();
        assert_ne!(v.viewport(), Viewport::default());
        v.reset();
        assert_eq!(v.viewport(), Viewport::default());
    }

    #[test]
    fn test_drag_moves_pan_by_delta_then_stops() {
        let mut v = view();
        v.zoom_in();
        let before = v.viewport().pan;
        v.pointer_down(Vec2::new(200.0, 100.0));
        assert!(v.is_dragging());
        v.pointer_move(Vec2::new(230.0, 80.0));
        v.pointer_move(Vec2::new(250.0, 140.0));
        let after = v.viewport().pan;
        assert_eq!(after - before, Vec2::new(50.0, 40.0));

        v.pointer_leave();
        assert!(!v.is_dragging());
        v.pointer_move(Vec2::new(0.0, 0.0));
        assert_eq!(v.viewport().pan, after);
        // Drag never touches the scale.
        assert_eq!(v.viewport().scale, 1.5);
    }

    #[test]
    fn test_zoom_bounds_report_noop() {
        let mut v = view();
        assert!(!v.zoom_out());
        while v.zoom_in() {}
        assert_eq!(v.scale_label(), "10.0x");
        assert!(!v.zoom_in());
        assert!(v.zoom_out());
    }

    #[test]
    fn test_move_without_press_is_ignored() {
        let mut v = view();
        v.pointer_move(Vec2::new(40.0, 40.0));
        assert_eq!(v.viewport(), Viewport::default());
    }
}
