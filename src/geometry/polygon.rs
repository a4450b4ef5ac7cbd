use tracing::{debug, warn};

use crate::error::{GeometryError, Result};
use crate::math::polygon_2d::{point_in_ring, ring_area, ring_contains_ring, rings_overlap};
use crate::math::{Point3, Ray, TOLERANCE};
use crate::tessellation::{triangulate_rings, LocalMesh, LocalPolyline};

use super::{EditFlags, GeometryHit, Properties};

/// A polygon with an outer ring and any number of hole rings.
///
/// Holds a triangulation of its filled area and one closed outline per ring.
/// Both are derived from the rings and rebuilt by [`Polygon::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub(super) vectors: Vec<Point3>,
    pub(super) holes: Vec<Vec<Point3>>,
    pub(super) properties: Properties,
    pub(super) flags: EditFlags,
    mesh: LocalMesh,
    outlines: Vec<LocalPolyline>,
}

impl Polygon {
    /// Creates a polygon from `[outer, hole, hole, ...]` rings and
    /// triangulates it.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::TooFewVertices`] if the outer ring has fewer
    /// than 3 vertices, or a tessellation error if triangulation fails.
    pub fn new(rings: Vec<Vec<Point3>>, properties: Properties) -> Result<Self> {
        let mut rings = rings.into_iter();
        let vectors = rings.next().unwrap_or_default();
        if vectors.len() < 3 {
            return Err(GeometryError::TooFewVertices {
                kind: "Polygon",
                min: 3,
                got: vectors.len(),
            }
            .into());
        }
        let mut polygon = Self {
            vectors,
            holes: rings.collect(),
            properties,
            flags: EditFlags::default(),
            mesh: LocalMesh::default(),
            outlines: Vec::new(),
        };
        polygon.update()?;
        Ok(polygon)
    }

    /// The outer ring.
    #[must_use]
    pub fn vectors(&self) -> &[Point3] {
        &self.vectors
    }

    /// The hole rings.
    #[must_use]
    pub fn holes(&self) -> &[Vec<Point3>] {
        &self.holes
    }

    /// All rings, outer first.
    pub fn rings(&self) -> impl Iterator<Item = &[Point3]> {
        std::iter::once(self.vectors.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    /// Re-triangulates the rings and regenerates the ring outlines.
    ///
    /// # Errors
    ///
    /// Returns a tessellation error if triangulation fails. The outlines are
    /// still regenerated and the previous mesh is kept.
    pub fn update(&mut self) -> Result<()> {
        self.outlines = self
            .rings()
            .map(|ring| LocalPolyline::from_world(ring, true))
            .collect();

        let rings: Vec<Vec<Point3>> = self.rings().map(<[Point3]>::to_vec).collect();
        match triangulate_rings(&rings) {
            Ok(mesh) => {
                self.mesh = mesh;
                Ok(())
            }
            Err(err) => {
                warn!(%err, "polygon triangulation failed, keeping previous mesh");
                Err(err)
            }
        }
    }

    /// The triangulated filled area.
    #[must_use]
    pub fn mesh(&self) -> &LocalMesh {
        &self.mesh
    }

    /// One closed outline per ring, outer first.
    #[must_use]
    pub fn outlines(&self) -> &[LocalPolyline] {
        &self.outlines
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Area of the outer ring minus the area of every hole, in the XY plane.
    #[must_use]
    pub fn filled_area(&self) -> f64 {
        ring_area(&self.vectors) - self.holes.iter().map(|h| ring_area(h)).sum::<f64>()
    }

    /// Cuts `other` out of this polygon as a new hole.
    ///
    /// Only applies when the filled area of `self` strictly contains the
    /// filled area of `other`: the outer ring of `other` lies inside the
    /// outer ring of `self` without touching it, and does not overlap any
    /// existing hole. Otherwise nothing changes and `Ok(false)` is returned.
    ///
    /// # Errors
    ///
    /// Returns a tessellation error if the polygon cannot be re-triangulated
    /// after the hole is added.
    pub fn carve_hole(&mut self, other: &Polygon) -> Result<bool> {
        let cut = &other.vectors;
        if !ring_contains_ring(&self.vectors, cut) {
            debug!("carve refused: polygon is not contained in the outer ring");
            return Ok(false);
        }
        if self.holes.iter().any(|hole| rings_overlap(hole, cut)) {
            debug!("carve refused: polygon overlaps an existing hole");
            return Ok(false);
        }
        if self.filled_area() - ring_area(cut) <= TOLERANCE {
            debug!("carve refused: difference is empty");
            return Ok(false);
        }

        self.holes.push(cut.clone());
        self.update()?;
        Ok(true)
    }

    /// Removes every hole whose ring contains `position`, then rebuilds.
    ///
    /// Returns whether a hole was removed.
    ///
    /// # Errors
    ///
    /// Returns a tessellation error if re-triangulation fails.
    pub fn fill_hole(&mut self, position: &Point3) -> Result<bool> {
        let before = self.holes.len();
        self.holes.retain(|hole| !point_in_ring(position, hole));
        let removed = self.holes.len() != before;
        self.update()?;
        Ok(removed)
    }

    pub(super) fn raycast(&self, ray: &Ray) -> Option<GeometryHit> {
        self.mesh
            .raycast(ray)
            .map(|(point, distance)| GeometryHit { point, distance })
    }
}
