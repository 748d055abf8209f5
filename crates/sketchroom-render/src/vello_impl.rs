//! Vello-based renderer implementation.

use crate::renderer::{Renderer, StrokeStyle};
use kurbo::{Affine, Line, Rect, Size, Stroke};
use peniko::{Color, Fill};
use vello::Scene;

/// Vello-based renderer for GPU-accelerated 2D graphics.
///
/// The scene is retained between frames: a clear resets it, and segment
/// draws append to it until the next full redraw.
pub struct VelloRenderer {
    /// The Vello scene being built.
    scene: Scene,
    size: Size,
}

impl Default for VelloRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VelloRenderer {
    /// Create a new Vello renderer.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            size: Size::ZERO,
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn size(&self) -> Size {
        self.size
    }
}

impl Renderer for VelloRenderer {
    fn resize(&mut self, size: Size) {
        self.size = size;
    }

    fn clear(&mut self, color: Color) {
        self.scene.reset();
        let rect = Rect::from_origin_size((0.0, 0.0), self.size);
        self.scene.fill(Fill::NonZero, Affine::IDENTITY, color, None, &rect);
    }

    fn draw_line(&mut self, line: Line, style: &StrokeStyle) {
        let stroke = Stroke::new(style.width);
        self.scene
            .stroke(&stroke, Affine::IDENTITY, style.color, None, &line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RenderContext;
    use kurbo::Point;
    use sketchroom_core::canvas::Canvas;
    use sketchroom_core::input::Redraw;
    use sketchroom_core::stroke::{History, Segment, Stroke as SketchStroke};

    #[test]
    fn test_renderer_creation() {
        let renderer = VelloRenderer::new();
        assert!(renderer.scene().encoding().is_empty());
    }

    #[test]
    fn test_redraw_sizes_scene() {
        let mut renderer = VelloRenderer::new();
        let mut canvas = Canvas::new();
        canvas.set_viewport_size(640.0, 480.0);

        renderer.redraw_canvas(&RenderContext::new(&canvas));
        assert_eq!(renderer.size(), Size::new(640.0, 480.0));
        assert!(!renderer.scene().encoding().is_empty());
    }

    #[test]
    fn test_build_scene_with_strokes() {
        let mut renderer = VelloRenderer::new();
        let mut canvas = Canvas::new();
        canvas.document.replace_history(History::from(vec![
            SketchStroke::new(vec![Segment { x0: 0.0, y0: 0.0, x1: 100.0, y1: 100.0 }]).unwrap(),
        ]));

        let ctx = RenderContext::new(&canvas);
        renderer.apply(Redraw::Full, &ctx);
        renderer.apply(Redraw::Segment(Line::new(Point::ZERO, Point::new(5.0, 5.0))), &ctx);
        assert!(!renderer.scene().encoding().is_empty());
    }
}
