//! Stroke data: segments, strokes and the shared drawing history.
//!
//! All coordinates are in true (model) space, so the serialized form is
//! independent of any client's pan or zoom.

use kurbo::{Line, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building strokes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrokeError {
    #[error("a stroke must contain at least one segment")]
    Empty,
}

/// One drawn line between two consecutive input samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Segment {
    /// Create a segment from its start and end points.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            x0: start.x,
            y0: start.y,
            x1: end.x,
            y1: end.y,
        }
    }

    pub fn start(&self) -> Point {
        Point::new(self.x0, self.y0)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    /// The segment as a kurbo line.
    pub fn to_line(&self) -> Line {
        Line::new(self.start(), self.end())
    }
}

impl From<Line> for Segment {
    fn from(line: Line) -> Self {
        Self::new(line.p0, line.p1)
    }
}

/// A committed press-drag-release gesture: a non-empty, ordered run of
/// segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Segment>", into = "Vec<Segment>")]
pub struct Stroke {
    segments: Vec<Segment>,
}

impl Stroke {
    /// Create a stroke, rejecting an empty segment list.
    pub fn new(segments: Vec<Segment>) -> Result<Self, StrokeError> {
        if segments.is_empty() {
            return Err(StrokeError::Empty);
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false for a constructed stroke.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl TryFrom<Vec<Segment>> for Stroke {
    type Error = StrokeError;

    fn try_from(segments: Vec<Segment>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<Stroke> for Vec<Segment> {
    fn from(stroke: Stroke) -> Self {
        stroke.segments
    }
}

/// Ordered strokes of a room. Insertion order is drawing order and undo
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    strokes: Vec<Stroke>,
}

impl History {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn last(&self) -> Option<&Stroke> {
        self.strokes.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stroke> {
        self.strokes.iter()
    }

    /// Every segment of every stroke, in drawing order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.strokes.iter().flat_map(|stroke| stroke.segments().iter())
    }

    pub(crate) fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    pub(crate) fn pop(&mut self) -> Option<Stroke> {
        self.strokes.pop()
    }
}

impl From<Vec<Stroke>> for History {
    fn from(strokes: Vec<Stroke>) -> Self {
        Self { strokes }
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Stroke;
    type IntoIter = std::slice::Iter<'a, Stroke>;

    fn into_iter(self) -> Self::IntoIter {
        self.strokes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segment(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment { x0, y0, x1, y1 }
    }

    #[test]
    fn test_empty_stroke_rejected() {
        assert_eq!(Stroke::new(Vec::new()), Err(StrokeError::Empty));
    }

    #[test]
    fn test_segment_points() {
        let seg = Segment::new(Point::new(1.0, 2.0), Point::new(3.0, 4.0));
        assert_eq!(seg.start(), Point::new(1.0, 2.0));
        assert_eq!(seg.end(), Point::new(3.0, 4.0));
        assert_eq!(Segment::from(seg.to_line()), seg);
    }

    #[test]
    fn test_history_wire_shape() {
        let stroke = Stroke::new(vec![segment(0.0, 0.0, 1.0, 1.0)]).unwrap();
        let history = History::from(vec![stroke]);

        let value = serde_json::to_value(&history).unwrap();
        assert_eq!(value, json!([[{"x0": 0.0, "y0": 0.0, "x1": 1.0, "y1": 1.0}]]));
    }

    #[test]
    fn test_history_parse() {
        let json = concat!(
            r#"[[{"x0":2,"y0":3,"x1":4,"y1":5}],"#,
            r#"[{"x0":0,"y0":0,"x1":1,"y1":0},{"x0":1,"y0":0,"x1":1,"y1":1}]]"#,
        );
        let history: History = serde_json::from_str(json).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.strokes()[0].segments(), &[segment(2.0, 3.0, 4.0, 5.0)]);
        assert_eq!(history.segments().count(), 3);
    }

    #[test]
    fn test_history_rejects_malformed() {
        assert!(serde_json::from_str::<History>(r#"{"x0":1}"#).is_err());
        assert!(serde_json::from_str::<History>(r#"[[]]"#).is_err());
        assert!(serde_json::from_str::<History>(r#"[[{"x0":1,"y0":2}]]"#).is_err());
        assert!(serde_json::from_str::<History>(r#"[[{"x0":"a","y0":2,"x1":3,"y1":4}]]"#).is_err());
    }
}
