mod line;
mod point;
mod polygon;

pub use line::Line;
pub use point::Point;
pub use polygon::Polygon;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::interaction::InteractionId;
use crate::math::distance_3d::{self, lies_on_segment};
use crate::math::{Aabb, Point3, Ray};

/// A vertex of a geometry, in world coordinates.
pub type Vertex = Point3;

/// Opaque key-value metadata carried through edits.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// The closed set of geometry variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

impl GeometryKind {
    /// Minimum number of vertices a committed geometry of this kind holds.
    #[must_use]
    pub fn min_vertices(self) -> usize {
        match self {
            Self::Point => 1,
            Self::Line => 2,
            Self::Polygon => 3,
        }
    }

    /// Returns the display name of the kind.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::Line => "Line",
            Self::Polygon => "Polygon",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transient editing state of a geometry.
///
/// `modified_by` is a lock token: while an interaction holds it, no other
/// interaction may start modifying the geometry, and snap candidates
/// referring to it are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditFlags {
    pub highlighted: bool,
    pub modified_by: Option<InteractionId>,
}

impl EditFlags {
    /// Returns `true` while some interaction is modifying the geometry.
    #[must_use]
    pub fn is_being_modified(&self) -> bool {
        self.modified_by.is_some()
    }

    /// Takes the modification lock for `by`.
    ///
    /// Returns `false` if another interaction already holds it.
    pub fn lock(&mut self, by: InteractionId) -> bool {
        match self.modified_by {
            Some(holder) if holder != by => false,
            _ => {
                self.modified_by = Some(by);
                true
            }
        }
    }

    /// Releases the lock if `by` holds it.
    pub fn unlock(&mut self, by: InteractionId) {
        if self.modified_by == Some(by) {
            self.modified_by = None;
        }
    }
}

/// Identifies one ring of a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ring {
    /// The single contour of a point or line, or the outer ring of a polygon.
    Outer,
    /// The hole ring at the given index.
    Hole(usize),
}

/// Position of a vertex inside a geometry.
///
/// Only valid until the next insertion or removal in the same ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexRef {
    pub ring: Ring,
    pub index: usize,
}

impl VertexRef {
    /// A vertex of the outer ring.
    #[must_use]
    pub fn outer(index: usize) -> Self {
        Self {
            ring: Ring::Outer,
            index,
        }
    }

    /// A vertex of hole ring `hole`.
    #[must_use]
    pub fn hole(hole: usize, index: usize) -> Self {
        Self {
            ring: Ring::Hole(hole),
            index,
        }
    }
}

/// A hit of a ray against the renderable form of a geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryHit {
    pub point: Point3,
    pub distance: f64,
}

/// An editable vector geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    Line(Line),
    Polygon(Polygon),
}

impl Geometry {
    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point(_) => GeometryKind::Point,
            Self::Line(_) => GeometryKind::Line,
            Self::Polygon(_) => GeometryKind::Polygon,
        }
    }

    #[must_use]
    pub fn properties(&self) -> &Properties {
        match self {
            Self::Point(g) => &g.properties,
            Self::Line(g) => &g.properties,
            Self::Polygon(g) => &g.properties,
        }
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        match self {
            Self::Point(g) => &mut g.properties,
            Self::Line(g) => &mut g.properties,
            Self::Polygon(g) => &mut g.properties,
        }
    }

    #[must_use]
    pub fn flags(&self) -> &EditFlags {
        match self {
            Self::Point(g) => &g.flags,
            Self::Line(g) => &g.flags,
            Self::Polygon(g) => &g.flags,
        }
    }

    pub fn flags_mut(&mut self) -> &mut EditFlags {
        match self {
            Self::Point(g) => &mut g.flags,
            Self::Line(g) => &mut g.flags,
            Self::Polygon(g) => &mut g.flags,
        }
    }

    /// The single contour of a point or line, or the outer ring of a polygon.
    #[must_use]
    pub fn vectors(&self) -> &[Point3] {
        match self {
            Self::Point(g) => g.vectors(),
            Self::Line(g) => g.vectors(),
            Self::Polygon(g) => g.vectors(),
        }
    }

    /// Hole rings; empty for points and lines.
    #[must_use]
    pub fn holes(&self) -> &[Vec<Point3>] {
        match self {
            Self::Polygon(g) => g.holes(),
            Self::Point(_) | Self::Line(_) => &[],
        }
    }

    /// Returns the vertices of `ring`, if it exists.
    #[must_use]
    pub fn ring(&self, ring: Ring) -> Option<&[Point3]> {
        match ring {
            Ring::Outer => Some(self.vectors()),
            Ring::Hole(i) => self.holes().get(i).map(Vec::as_slice),
        }
    }

    /// Returns the vertex at `at`, if it exists.
    #[must_use]
    pub fn vertex(&self, at: VertexRef) -> Option<Point3> {
        self.ring(at.ring)?.get(at.index).copied()
    }

    fn ring_mut(&mut self, ring: Ring) -> Option<&mut Vec<Point3>> {
        match (self, ring) {
            (Self::Point(_), _) | (Self::Line(_), Ring::Hole(_)) => None,
            (Self::Line(g), Ring::Outer) => Some(&mut g.vectors),
            (Self::Polygon(g), Ring::Outer) => Some(&mut g.vectors),
            (Self::Polygon(g), Ring::Hole(i)) => g.holes.get_mut(i),
        }
    }

    /// Overwrites the vertex at `at`. The renderable form is not rebuilt
    /// until [`Geometry::update`] is called.
    ///
    /// Returns `false` if `at` does not exist.
    pub fn set_vertex(&mut self, at: VertexRef, position: Point3) -> bool {
        if let Self::Point(point) = self {
            if at == VertexRef::outer(0) {
                point.set_position(position);
                return true;
            }
            return false;
        }
        match self.ring_mut(at.ring).and_then(|ring| ring.get_mut(at.index)) {
            Some(vertex) => {
                *vertex = position;
                true
            }
            None => false,
        }
    }

    /// Inserts `position` before index `at.index` of `at.ring`.
    ///
    /// Returns the reference of the inserted vertex, or `None` for points
    /// and out-of-range positions.
    pub fn insert_vertex(&mut self, at: VertexRef, position: Point3) -> Option<VertexRef> {
        let ring = self.ring_mut(at.ring)?;
        if at.index > ring.len() {
            return None;
        }
        ring.insert(at.index, position);
        Some(at)
    }

    /// Removes the vertex at `at`.
    ///
    /// Refused (returns `false`) when the ring would drop below its minimum:
    /// 2 vertices for a line, 3 for any polygon ring. Points never lose their
    /// vertex.
    pub fn remove_vertex(&mut self, at: VertexRef) -> bool {
        let min = self.kind().min_vertices();
        let Some(ring) = self.ring_mut(at.ring) else {
            return false;
        };
        if ring.len() <= min || at.index >= ring.len() {
            return false;
        }
        ring.remove(at.index);
        true
    }

    /// Rebuilds the renderable form from the vertex data.
    ///
    /// # Errors
    ///
    /// Returns an error if a polygon cannot be triangulated; the previous
    /// triangulation is kept in that case.
    pub fn update(&mut self) -> Result<()> {
        match self {
            Self::Point(_) => Ok(()),
            Self::Line(g) => {
                g.update();
                Ok(())
            }
            Self::Polygon(g) => g.update(),
        }
    }

    /// Bounding box over every vertex of every ring.
    #[must_use]
    pub fn bbox(&self) -> Option<Aabb> {
        let outer = Aabb::from_points(self.vectors())?;
        Some(
            self.holes()
                .iter()
                .filter_map(|hole| Aabb::from_points(hole))
                .fold(outer, |acc, b| acc.union(&b)),
        )
    }

    /// Intersects `ray` with the renderable form of the geometry.
    ///
    /// Points and lines are hit within `threshold` of the ray; polygons are
    /// hit on their triangulated surface.
    #[must_use]
    pub fn raycast(&self, ray: &Ray, threshold: f64) -> Option<GeometryHit> {
        match self {
            Self::Point(g) => g.raycast(ray, threshold),
            Self::Line(g) => g.raycast(ray, threshold),
            Self::Polygon(g) => g.raycast(ray),
        }
    }

    /// Finds the vertex nearest to `target` across the outer ring and every
    /// hole. Ties keep the earlier ring.
    #[must_use]
    pub fn nearest_vertex(&self, target: &Point3) -> Option<(VertexRef, f64)> {
        let rings = std::iter::once((Ring::Outer, self.vectors()))
            .chain(self.holes().iter().enumerate().map(|(i, h)| (Ring::Hole(i), h.as_slice())));

        let mut best: Option<(VertexRef, f64)> = None;
        for (ring, points) in rings {
            let Some((index, d)) = distance_3d::nearest_vertex(points, target) else {
                continue;
            };
            if best.is_none_or(|(_, current)| d < current) {
                best = Some((VertexRef { ring, index }, d));
            }
        }
        best
    }

    /// Finds where `point` would be inserted if it lies on an edge.
    ///
    /// Edges are tested in order: outer ring segments, the closing edge of a
    /// polygon's outer ring, then each hole ring including its closing edge.
    /// The first edge passing the coarse on-segment test wins.
    #[must_use]
    pub fn edge_insertion(&self, point: &Point3) -> Option<VertexRef> {
        if let Self::Point(_) = self {
            return None;
        }
        let outer = self.vectors();
        for i in 1..outer.len() {
            if lies_on_segment(&outer[i - 1], &outer[i], point) {
                return Some(VertexRef::outer(i));
            }
        }
        if let Self::Polygon(_) = self {
            if let (Some(first), Some(last)) = (outer.first(), outer.last()) {
                if outer.len() > 1 && lies_on_segment(first, last, point) {
                    return Some(VertexRef::outer(outer.len()));
                }
            }
        }
        for (h, hole) in self.holes().iter().enumerate() {
            let n = hole.len();
            for j in 1..=n {
                if n > 1 && lies_on_segment(&hole[j - 1], &hole[j % n], point) {
                    return Some(VertexRef::hole(h, j));
                }
            }
        }
        None
    }
}

impl From<Point> for Geometry {
    fn from(value: Point) -> Self {
        Self::Point(value)
    }
}

impl From<Line> for Geometry {
    fn from(value: Line) -> Self {
        Self::Line(value)
    }
}

impl From<Polygon> for Geometry {
    fn from(value: Polygon) -> Self {
        Self::Polygon(value)
    }
}
