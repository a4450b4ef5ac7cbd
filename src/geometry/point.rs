use crate::math::intersect_3d::ray_point_query;
use crate::math::{Point3, Ray};

use super::{EditFlags, GeometryHit, Properties};

/// A single standalone vertex.
///
/// Points have no renderable of their own: the owning layer batches all of
/// its points into one localized point buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub(super) vector: Point3,
    pub(super) properties: Properties,
    pub(super) flags: EditFlags,
}

impl Point {
    #[must_use]
    pub fn new(vector: Point3, properties: Properties) -> Self {
        Self {
            vector,
            properties,
            flags: EditFlags::default(),
        }
    }

    /// Returns the position of the point.
    #[must_use]
    pub fn position(&self) -> Point3 {
        self.vector
    }

    /// Moves the point.
    pub fn set_position(&mut self, position: Point3) {
        self.vector = position;
    }

    /// The point as a one-element vertex slice.
    #[must_use]
    pub fn vectors(&self) -> &[Point3] {
        std::slice::from_ref(&self.vector)
    }

    pub(super) fn raycast(&self, ray: &Ray, threshold: f64) -> Option<GeometryHit> {
        ray_point_query(ray, &self.vector, threshold).map(|hit| GeometryHit {
            point: hit.point,
            distance: hit.distance,
        })
    }
}
