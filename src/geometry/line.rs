use crate::error::{GeometryError, Result};
use crate::math::{Point3, Ray};
use crate::tessellation::LocalPolyline;

use super::{EditFlags, GeometryHit, Properties};

/// An open polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub(super) vectors: Vec<Point3>,
    pub(super) properties: Properties,
    pub(super) flags: EditFlags,
    outline: LocalPolyline,
}

impl Line {
    /// Creates a line and builds its renderable polyline.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::TooFewVertices`] with fewer than 2 vertices.
    pub fn new(vectors: Vec<Point3>, properties: Properties) -> Result<Self> {
        if vectors.len() < 2 {
            return Err(GeometryError::TooFewVertices {
                kind: "Line",
                min: 2,
                got: vectors.len(),
            }
            .into());
        }
        let mut line = Self {
            vectors,
            properties,
            flags: EditFlags::default(),
            outline: LocalPolyline::default(),
        };
        line.update();
        Ok(line)
    }

    #[must_use]
    pub fn vectors(&self) -> &[Point3] {
        &self.vectors
    }

    /// Replaces the renderable polyline with one rebuilt from the vertices,
    /// localized to the first vertex.
    pub fn update(&mut self) {
        self.outline = LocalPolyline::from_world(&self.vectors, false);
    }

    /// The renderable polyline.
    #[must_use]
    pub fn outline(&self) -> &LocalPolyline {
        &self.outline
    }

    /// Cumulative distance along the line at every vertex.
    #[must_use]
    pub fn line_distances(&self) -> Vec<f64> {
        self.outline.line_distances()
    }

    /// Total length of the line.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.line_distances().last().copied().unwrap_or(0.0)
    }

    pub(super) fn raycast(&self, ray: &Ray, threshold: f64) -> Option<GeometryHit> {
        self.outline.raycast(ray, threshold).map(|hit| GeometryHit {
            point: hit.point,
            distance: hit.distance,
        })
    }
}
