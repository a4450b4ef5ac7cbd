use tracing::debug;

use crate::geometry::{GeometryKind, Line, Polygon, Properties};
use crate::math::Point3;
use crate::tessellation::LocalPoints;

/// Vertices of an in-progress drawing and their preview renderables.
///
/// The previews are rebuilt after every change: a point batch of all
/// buffered vertices, plus a line once two vertices are buffered for a
/// line drawing, or a polygon once three are buffered for a polygon.
#[derive(Debug, Clone)]
pub struct DrawBuffer {
    kind: GeometryKind,
    vectors: Vec<Point3>,
    points: LocalPoints,
    line: Option<Line>,
    polygon: Option<Polygon>,
}

impl DrawBuffer {
    #[must_use]
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            vectors: Vec::new(),
            points: LocalPoints::default(),
            line: None,
            polygon: None,
        }
    }

    #[must_use]
    pub fn vectors(&self) -> &[Point3] {
        &self.vectors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Preview of the buffered vertices as points.
    #[must_use]
    pub fn points(&self) -> &LocalPoints {
        &self.points
    }

    #[must_use]
    pub fn preview_line(&self) -> Option<&Line> {
        self.line.as_ref()
    }

    #[must_use]
    pub fn preview_polygon(&self) -> Option<&Polygon> {
        self.polygon.as_ref()
    }

    /// Appends a vertex and returns its index.
    pub fn push(&mut self, vertex: Point3) -> usize {
        self.vectors.push(vertex);
        self.refresh();
        self.vectors.len() - 1
    }

    /// Removes the vertex at `index`, or the last one when `index` is
    /// `None`.
    pub fn remove(&mut self, index: Option<usize>) -> Option<Point3> {
        let index = index.or_else(|| self.vectors.len().checked_sub(1))?;
        if index >= self.vectors.len() {
            return None;
        }
        let removed = self.vectors.remove(index);
        self.refresh();
        Some(removed)
    }

    /// Takes the buffered vertices, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<Point3> {
        let vectors = std::mem::take(&mut self.vectors);
        self.refresh();
        vectors
    }

    pub fn clear(&mut self) {
        self.vectors.clear();
        self.refresh();
    }

    fn refresh(&mut self) {
        self.points = LocalPoints::from_world(&self.vectors);
        self.line = None;
        self.polygon = None;
        match self.kind {
            GeometryKind::Line if self.vectors.len() >= 2 => {
                self.line = Line::new(self.vectors.clone(), Properties::new()).ok();
            }
            GeometryKind::Polygon if self.vectors.len() >= 3 => {
                match Polygon::new(vec![self.vectors.clone()], Properties::new()) {
                    Ok(polygon) => self.polygon = Some(polygon),
                    Err(err) => debug!(%err, "polygon preview not available"),
                }
            }
            GeometryKind::Point | GeometryKind::Line | GeometryKind::Polygon => {}
        }
    }
}
