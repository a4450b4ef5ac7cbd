use crate::math::intersect_3d::ray_point_query;
use crate::math::{Point3, Ray, Vector3};

/// A batch of points stored relative to a root vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPoints {
    /// World position the offsets are relative to.
    pub root: Point3,
    /// Point positions, relative to `root`.
    pub offsets: Vec<Vector3>,
}

impl Default for LocalPoints {
    fn default() -> Self {
        Self {
            root: Point3::origin(),
            offsets: Vec::new(),
        }
    }
}

/// A point of a [`LocalPoints`] batch that passed a ray pick test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointHit {
    /// Index of the point in the batch.
    pub index: usize,
    /// World position of the picked point itself.
    pub position: Point3,
    /// Distance along the ray to the closest approach.
    pub distance: f64,
    /// Distance between the picked point and the ray.
    pub distance_to_ray: f64,
}

impl LocalPoints {
    /// Builds a batch rooted at the first of `points`.
    #[must_use]
    pub fn from_world(points: &[Point3]) -> Self {
        let Some(&root) = points.first() else {
            return Self::default();
        };
        Self {
            root,
            offsets: points.iter().map(|p| p - root).collect(),
        }
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns `true` if the batch holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Returns the world position of point `index`.
    #[must_use]
    pub fn world_point(&self, index: usize) -> Option<Point3> {
        self.offsets.get(index).map(|v| self.root + v)
    }

    /// All points within `threshold` of `ray`, nearest along the ray first.
    #[must_use]
    pub fn raycast(&self, ray: &Ray, threshold: f64) -> Vec<PointHit> {
        let local_ray = ray.localized(&self.root);
        let mut hits: Vec<PointHit> = self
            .offsets
            .iter()
            .enumerate()
            .filter_map(|(index, offset)| {
                ray_point_query(&local_ray, &Point3::from(*offset), threshold).map(|hit| PointHit {
                    index,
                    position: self.root + offset,
                    distance: hit.distance,
                    distance_to_ray: hit.distance_to_ray,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn batch_is_rooted_at_first_point() {
        let batch = LocalPoints::from_world(&[p(500.0, 500.0, 2.0), p(501.0, 500.0, 2.0)]);
        assert_eq!(batch.root, p(500.0, 500.0, 2.0));
        assert_eq!(batch.offsets[1], Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(batch.world_point(1), Some(p(501.0, 500.0, 2.0)));
        assert!(batch.world_point(2).is_none());
    }

    #[test]
    fn raycast_sorts_by_distance_along_ray() {
        let batch = LocalPoints::from_world(&[p(0.0, 0.0, 0.0), p(0.1, 0.0, 5.0), p(3.0, 0.0, 0.0)]);
        let ray = Ray::new(p(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        let hits = batch.raycast(&ray, 0.3);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].index, 1);
        assert_eq!(hits[0].position, p(0.1, 0.0, 5.0));
        assert_eq!(hits[1].index, 0);
    }

    #[test]
    fn empty_batch_has_no_hits() {
        let batch = LocalPoints::from_world(&[]);
        assert!(batch.is_empty());
        let ray = Ray::new(p(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0)).unwrap();
        assert!(batch.raycast(&ray, 1.0).is_empty());
    }
}
