//! Canvas document and runtime state.

use crate::camera::Camera;
use crate::stroke::{History, Segment, Stroke};
use kurbo::Size;

/// Default viewport size before the host surface reports its own.
pub const DEFAULT_VIEWPORT: Size = Size::new(800.0, 600.0);

/// The drawing history of a room as mirrored by this client, plus the local
/// undo stack and the stroke currently being drawn.
///
/// History and the undo stack are disjoint: a stroke lives in at most one of
/// them. In-progress segments never reach the history until the whole stroke
/// is committed.
#[derive(Debug, Clone, Default)]
pub struct CanvasDocument {
    history: History,
    /// Strokes removed by undo, most recent last.
    undo_stack: Vec<Stroke>,
    /// Transient buffer for the stroke in progress.
    pending: Vec<Segment>,
}

impl CanvasDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document mirroring an existing history.
    pub fn with_history(history: History) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn undo_stack(&self) -> &[Stroke] {
        &self.undo_stack
    }

    /// Segments of the stroke in progress.
    pub fn pending(&self) -> &[Segment] {
        &self.pending
    }

    /// Start a new stroke, discarding any unfinished one.
    pub fn begin_stroke(&mut self) {
        self.pending.clear();
    }

    /// Append a segment to the stroke in progress.
    pub fn extend_stroke(&mut self, segment: Segment) {
        self.pending.push(segment);
    }

    /// Commit the stroke in progress to the history.
    ///
    /// A new stroke invalidates the redo path, so the undo stack is cleared.
    /// Returns `None` and leaves the history untouched when nothing was drawn.
    pub fn commit_stroke(&mut self) -> Option<Stroke> {
        let segments = std::mem::take(&mut self.pending);
        let stroke = Stroke::new(segments).ok()?;
        self.history.push(stroke.clone());
        self.undo_stack.clear();
        Some(stroke)
    }

    /// Undo the last stroke.
    /// Returns the stroke moved to the undo stack, or `None` if the history is empty.
    pub fn undo(&mut self) -> Option<Stroke> {
        let stroke = self.history.pop()?;
        self.undo_stack.push(stroke.clone());
        Some(stroke)
    }

    /// Redo the last undone stroke.
    /// Returns the stroke moved back to the history, or `None` if there is nothing to redo.
    pub fn redo(&mut self) -> Option<Stroke> {
        let stroke = self.undo_stack.pop()?;
        self.history.push(stroke.clone());
        Some(stroke)
    }

    /// Replace the history with an authoritative remote snapshot.
    ///
    /// The local undo stack no longer corresponds to a known suffix of the
    /// new history, so it is cleared.
    pub fn replace_history(&mut self, history: History) {
        self.history = history;
        self.undo_stack.clear();
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.undo_stack.is_empty()
    }
}

/// Runtime canvas state of one client (never shared).
#[derive(Debug, Clone)]
pub struct Canvas {
    /// The mirrored room document.
    pub document: CanvasDocument,
    /// Camera for view transform.
    pub camera: Camera,
    /// Viewport size in screen pixels.
    pub viewport_size: Size,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create a new canvas with an empty document.
    pub fn new() -> Self {
        Self::with_document(CanvasDocument::new())
    }

    /// Create a canvas with an existing document.
    pub fn with_document(document: CanvasDocument) -> Self {
        Self {
            document,
            camera: Camera::new(),
            viewport_size: DEFAULT_VIEWPORT,
        }
    }

    /// Set the viewport size.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = Size::new(width, height);
    }
}
