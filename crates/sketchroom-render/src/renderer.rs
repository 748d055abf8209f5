//! Renderer trait abstraction.

use kurbo::{Line, Size};
use peniko::Color;
use sketchroom_core::canvas::Canvas;
use sketchroom_core::input::Redraw;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Pen used for every stroke.
#[derive(Debug, Clone, Copy)]
pub struct StrokeStyle {
    pub color: Color,
    /// Width in screen pixels; does not scale with zoom.
    pub width: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Color::from_rgba8(255, 0, 0, 255),
            width: 2.0,
        }
    }
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The canvas to render.
    pub canvas: &'a Canvas,
    /// Viewport size in physical pixels.
    pub viewport_size: Size,
    /// Background color.
    pub background_color: Color,
    pub stroke_style: StrokeStyle,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context sized to the canvas viewport.
    pub fn new(canvas: &'a Canvas) -> Self {
        Self {
            canvas,
            viewport_size: canvas.viewport_size,
            background_color: Color::from_rgba8(0, 0, 0, 255),
            stroke_style: StrokeStyle::default(),
        }
    }

    /// Override the viewport size (e.g. to match the physical surface).
    pub fn with_viewport_size(mut self, size: Size) -> Self {
        self.viewport_size = size;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the stroke style.
    pub fn with_stroke_style(mut self, style: StrokeStyle) -> Self {
        self.stroke_style = style;
        self
    }
}

/// Trait for rendering backends.
///
/// Backends supply three primitives; full and incremental repaints are built
/// on top of them.
pub trait Renderer: Send + Sync {
    /// Resize the drawing surface.
    fn resize(&mut self, size: Size);

    /// Fill the whole surface with `color`, discarding previous content.
    fn clear(&mut self, color: Color);

    /// Draw a screen-space line.
    fn draw_line(&mut self, line: Line, style: &StrokeStyle);

    /// Repaint the whole history through the current camera.
    fn redraw_canvas(&mut self, ctx: &RenderContext) {
        self.resize(ctx.viewport_size);
        self.clear(ctx.background_color);

        let camera = &ctx.canvas.camera;
        for segment in ctx.canvas.document.history().segments() {
            let line = Line::new(camera.to_screen(segment.start()), camera.to_screen(segment.end()));
            self.draw_line(line, &ctx.stroke_style);
        }
    }

    /// Draw one new screen-space segment on top of the current frame.
    fn draw_segment(&mut self, line: Line, ctx: &RenderContext) {
        self.draw_line(line, &ctx.stroke_style);
    }

    /// Carry out a redraw request.
    fn apply(&mut self, redraw: Redraw, ctx: &RenderContext) {
        match redraw {
            Redraw::None => {}
            Redraw::Segment(line) => self.draw_segment(line, ctx),
            Redraw::Full => self.redraw_canvas(ctx),
        }
    }
}

/// A recorded drawing command.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Clear to an RGBA8 color.
    Clear([u8; 4]),
    Line { line: Line, rgba: [u8; 4], width: f64 },
}

fn rgba8(color: Color) -> [u8; 4] {
    let rgba = color.to_rgba8();
    [rgba.r, rgba.g, rgba.b, rgba.a]
}

/// Headless renderer that records the commands of the current frame.
///
/// A clear discards everything drawn before it, like a real surface would.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    size: Size,
    ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// The lines drawn since the last clear.
    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Line { line, .. } => Some(*line),
            _ => None,
        })
    }
}

impl Renderer for DisplayList {
    fn resize(&mut self, size: Size) {
        self.size = size;
    }

    fn clear(&mut self, color: Color) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear(rgba8(color)));
    }

    fn draw_line(&mut self, line: Line, style: &StrokeStyle) {
        self.ops.push(DrawOp::Line {
            line,
            rgba: rgba8(style.color),
            width: style.width,
        });
    }
}
